//! Module tree loading.
//!
//! The root module is the set of `*.tf` files in a directory. Every
//! `module` call found in a loaded module becomes a child scope with its own
//! variable bindings, so the same child source called twice is loaded twice.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use hcl::{Map, Value};
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::ast::{Block, ConfigFile};
use crate::error::{LoadError, LoadResult};
use crate::eval::Evaluator;

const DEFAULT_VARFILE: &str = "terraform.tfvars";
const MODULE_MANIFEST: &str = ".terraform/modules/modules.json";

/// Module call arguments that are not input variables.
const META_ARGUMENTS: &[&str] = &["source", "version", "providers", "count", "for_each", "depends_on"];

/// One module scope: its files, its evaluation context and its children.
#[derive(Debug, Clone)]
pub struct Module {
    /// Dotted call path, empty for the root module.
    pub key: String,
    pub source: Option<String>,
    pub dir: PathBuf,
    pub files: Vec<ConfigFile>,
    pub evaluator: Evaluator,
    pub children: Vec<Module>,
}

impl Module {
    /// Build a module directly from parsed files.
    pub fn from_files(key: impl Into<String>, files: Vec<ConfigFile>, evaluator: Evaluator) -> Self {
        Self {
            key: key.into(),
            source: None,
            dir: PathBuf::from("."),
            files,
            evaluator,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Module) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_root(&self) -> bool {
        self.key.is_empty()
    }

    /// Name used in logs and reports.
    pub fn display_name(&self) -> &str {
        if self.is_root() {
            "root"
        } else {
            &self.key
        }
    }

    /// Resource blocks of the given type across all files.
    pub fn resources<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.files
            .iter()
            .flat_map(move |file| file.resources(resource_type))
    }

    pub fn has_resources(&self, resource_type: &str) -> bool {
        self.resources(resource_type).next().is_some()
    }

    /// The `provider "<name>"` block, if any.
    pub fn provider(&self, name: &str) -> Option<&Block> {
        self.files
            .iter()
            .flat_map(|file| file.blocks_of("provider"))
            .find(|block| block.label(0) == Some(name))
    }

    pub fn file(&self, path: &str) -> Option<&ConfigFile> {
        self.files.iter().find(|file| file.path == path)
    }

    /// Number of modules in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Module::count).sum::<usize>()
    }
}

/// Options controlling how the module tree is loaded.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Extra variable files applied to the root module after `terraform.tfvars`.
    pub varfiles: Vec<PathBuf>,
    /// Module sources that are never loaded.
    pub ignore_modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ModuleManifest {
    #[serde(rename = "Modules", default)]
    modules: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Dir")]
    dir: String,
}

/// Loads a root module and every module it calls.
pub struct ModuleLoader {
    options: LoaderOptions,
}

impl ModuleLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Load the module tree rooted at `dir`.
    pub fn load(&self, dir: &Path) -> LoadResult<Module> {
        if !dir.is_dir() {
            return Err(LoadError::NotADirectory(dir.to_path_buf()));
        }
        info!("Loading configuration from {:?}", dir);

        let manifest = read_manifest(dir)?;
        let files = load_dir(dir)?;

        let mut variables = variable_defaults(&files);
        for varfile in self.root_varfiles(dir)? {
            apply_varfile(&varfile, &mut variables)?;
        }

        let mut root = Module {
            key: String::new(),
            source: None,
            dir: dir.to_path_buf(),
            evaluator: evaluator_with_locals(variables, &files),
            files,
            children: Vec::new(),
        };

        let mut ancestors = vec![canonical(dir)];
        root.children = self.load_children(&root, &manifest, &mut ancestors)?;

        info!("Loaded {} module(s)", root.count());
        Ok(root)
    }

    fn root_varfiles(&self, dir: &Path) -> LoadResult<Vec<PathBuf>> {
        let mut varfiles = Vec::new();
        let default = dir.join(DEFAULT_VARFILE);
        if default.is_file() {
            varfiles.push(default);
        }
        for varfile in &self.options.varfiles {
            if !varfile.is_file() {
                return Err(LoadError::VarfileNotFound(varfile.clone()));
            }
            varfiles.push(varfile.clone());
        }
        Ok(varfiles)
    }

    fn load_children(
        &self,
        parent: &Module,
        manifest: &HashMap<String, PathBuf>,
        ancestors: &mut Vec<PathBuf>,
    ) -> LoadResult<Vec<Module>> {
        let mut children = Vec::new();

        let calls: Vec<&Block> = parent
            .files
            .iter()
            .flat_map(|file| file.blocks_of("module"))
            .collect();

        for call in calls {
            let Some(name) = call.label(0) else {
                continue;
            };
            let key = if parent.is_root() {
                name.to_string()
            } else {
                format!("{}.{}", parent.key, name)
            };

            let source = call
                .attribute("source")
                .and_then(|attr| match attr.token.expression() {
                    Some(hcl::Expression::String(s)) => Some(s.clone()),
                    _ => None,
                });
            let Some(source) = source else {
                warn!("Module {} has no literal source, skipping", key);
                continue;
            };

            if self.options.ignore_modules.iter().any(|ignored| ignored == &source) {
                info!("Ignoring module {} ({})", key, source);
                continue;
            }

            let Some(dir) = resolve_module_dir(&key, &source, &parent.dir, manifest) else {
                warn!(
                    "Module {} ({}) is not installed, skipping. Run `terraform init` to fetch it.",
                    key, source
                );
                continue;
            };

            let canonical_dir = canonical(&dir);
            if ancestors.contains(&canonical_dir) {
                warn!("Module {} refers back to {:?}, skipping", key, dir);
                continue;
            }

            debug!("Loading module {} from {:?}", key, dir);
            let files = load_dir(&dir)?;
            let mut variables = variable_defaults(&files);
            for (name, value) in module_arguments(call, parent) {
                variables.insert(name, value);
            }

            let mut child = Module {
                key,
                source: Some(source),
                evaluator: evaluator_with_locals(variables, &files),
                dir,
                files,
                children: Vec::new(),
            };

            ancestors.push(canonical_dir);
            child.children = self.load_children(&child, manifest, ancestors)?;
            ancestors.pop();

            children.push(child);
        }

        Ok(children)
    }
}

/// Parse every `*.tf` file directly inside `dir`, sorted by file name.
pub fn load_dir(dir: &Path) -> LoadResult<Vec<ConfigFile>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "tf"))
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let source = fs::read_to_string(path).map_err(|e| LoadError::read(path, e))?;
            ConfigFile::parse(display_path(path), &source)
        })
        .collect()
}

/// Path as issues cite it, without a leading `./`.
fn display_path(path: &Path) -> String {
    path.strip_prefix(".").unwrap_or(path).display().to_string()
}

fn read_manifest(root_dir: &Path) -> LoadResult<HashMap<String, PathBuf>> {
    let path = root_dir.join(MODULE_MANIFEST);
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(&path).map_err(|e| LoadError::read(&path, e))?;
    let manifest: ModuleManifest = serde_json::from_str(&content)?;

    Ok(manifest
        .modules
        .into_iter()
        .filter(|entry| !entry.key.is_empty())
        .map(|entry| (entry.key, root_dir.join(entry.dir)))
        .collect())
}

fn resolve_module_dir(
    key: &str,
    source: &str,
    parent_dir: &Path,
    manifest: &HashMap<String, PathBuf>,
) -> Option<PathBuf> {
    if let Some(dir) = manifest.get(key) {
        return dir.is_dir().then(|| dir.clone());
    }
    if source.starts_with("./") || source.starts_with("../") {
        let dir = parent_dir.join(source);
        return dir.is_dir().then_some(dir);
    }
    None
}

fn canonical(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}

/// Defaults declared by `variable` blocks.
fn variable_defaults(files: &[ConfigFile]) -> Map<String, Value> {
    let evaluator = Evaluator::new();
    let mut variables = Map::new();

    for block in files.iter().flat_map(|file| file.blocks_of("variable")) {
        let Some(name) = block.label(0) else {
            continue;
        };
        let Some(default) = block.attribute("default") else {
            continue;
        };
        let Some(expr) = default.token.expression() else {
            continue;
        };
        match evaluator.evaluate(expr) {
            Ok(value) => {
                variables.insert(name.to_string(), value);
            }
            Err(e) => warn!("Default of variable {} is not evaluable: {}", name, e),
        }
    }

    variables
}

fn apply_varfile(path: &Path, variables: &mut Map<String, Value>) -> LoadResult<()> {
    debug!("Applying variable file {:?}", path);
    let source = fs::read_to_string(path).map_err(|e| LoadError::read(path, e))?;
    let file = ConfigFile::parse(display_path(path), &source)?;
    let evaluator = Evaluator::new();

    for attr in &file.attributes {
        let Some(expr) = attr.token.expression() else {
            continue;
        };
        match evaluator.evaluate(expr) {
            Ok(value) => {
                variables.insert(attr.name.clone(), value);
            }
            Err(e) => warn!("{}:{}: {} is not evaluable: {}", file.path, attr.line(), attr.name, e),
        }
    }
    Ok(())
}

/// Input variables passed by a module call, evaluated in the caller's scope.
fn module_arguments(call: &Block, parent: &Module) -> Vec<(String, Value)> {
    call.attributes
        .iter()
        .filter(|attr| !META_ARGUMENTS.contains(&attr.name.as_str()))
        .filter_map(|attr| {
            let expr = attr.token.expression()?;
            match parent.evaluator.evaluate(expr) {
                Ok(value) => Some((attr.name.clone(), value)),
                Err(e) => {
                    warn!(
                        "{}:{}: argument {} is not evaluable, leaving it unset: {}",
                        attr.file(),
                        attr.line(),
                        attr.name,
                        e
                    );
                    None
                }
            }
        })
        .collect()
}

/// Evaluate `locals` blocks, repeating until no further local resolves.
fn evaluator_with_locals(variables: Map<String, Value>, files: &[ConfigFile]) -> Evaluator {
    let mut evaluator = Evaluator::with_variables(variables);
    let mut pending: Vec<_> = files
        .iter()
        .flat_map(|file| file.blocks_of("locals"))
        .flat_map(|block| block.attributes.iter())
        .collect();

    loop {
        let before = pending.len();
        pending.retain(|attr| {
            let Some(expr) = attr.token.expression() else {
                return false;
            };
            match evaluator.evaluate(expr) {
                Ok(value) => {
                    evaluator.set_local(attr.name.clone(), value);
                    false
                }
                Err(_) => true,
            }
        });
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    for attr in pending {
        debug!("{}:{}: local.{} is not evaluable", attr.file(), attr.line(), attr.name);
    }
    evaluator
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        if let Some(parent) = dir.join(name).parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_root_files_sorted() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.tf", "resource \"aws_instance\" \"b\" {}\n");
        write(temp.path(), "a.tf", "resource \"aws_instance\" \"a\" {}\n");
        write(temp.path(), "notes.txt", "not terraform");

        let root = ModuleLoader::new(LoaderOptions::default()).load(temp.path()).unwrap();
        assert!(root.is_root());
        assert_eq!(root.files.len(), 2);
        assert!(root.files[0].path.ends_with("a.tf"));

        let names: Vec<_> = root
            .resources("aws_instance")
            .filter_map(|block| block.resource_name())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_variables_defaults_tfvars_and_locals() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "main.tf",
            r#"
variable "env" {
  default = "dev"
}
variable "size" {
  default = "t2.micro"
}
locals {
  name   = "${local.prefix}-app"
  prefix = "${var.env}"
}
"#,
        );
        write(temp.path(), "terraform.tfvars", "env = \"prod\"\n");

        let root = ModuleLoader::new(LoaderOptions::default()).load(temp.path()).unwrap();
        assert_eq!(root.evaluator.variable("env"), Some(&Value::from("prod")));
        assert_eq!(root.evaluator.variable("size"), Some(&Value::from("t2.micro")));
        assert_eq!(root.evaluator.local("name"), Some(&Value::from("prod-app")));
    }

    #[test]
    fn test_configured_varfile_overrides_default_tfvars() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "main.tf", "variable \"env\" {}\n");
        write(temp.path(), "terraform.tfvars", "env = \"prod\"\n");
        write(temp.path(), "staging.tfvars", "env = \"staging\"\n");

        let options = LoaderOptions {
            varfiles: vec![temp.path().join("staging.tfvars")],
            ..Default::default()
        };
        let root = ModuleLoader::new(options).load(temp.path()).unwrap();
        assert_eq!(root.evaluator.variable("env"), Some(&Value::from("staging")));
    }

    #[test]
    fn test_missing_varfile_is_an_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "main.tf", "");
        let options = LoaderOptions {
            varfiles: vec![temp.path().join("missing.tfvars")],
            ..Default::default()
        };
        let err = ModuleLoader::new(options).load(temp.path()).unwrap_err();
        assert!(matches!(err, LoadError::VarfileNotFound(_)));
    }

    #[test]
    fn test_local_child_modules_get_call_arguments() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "main.tf",
            r#"
variable "name" {
  default = "demo"
}
module "cache_a" {
  source     = "./cache"
  cluster_id = "${var.name}-a"
}
module "cache_b" {
  source     = "./cache"
  cluster_id = "${var.name}-b"
}
"#,
        );
        write(
            temp.path(),
            "cache/main.tf",
            "variable \"cluster_id\" {}\nresource \"aws_elasticache_cluster\" \"this\" {\n  cluster_id = var.cluster_id\n}\n",
        );

        let root = ModuleLoader::new(LoaderOptions::default()).load(temp.path()).unwrap();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.count(), 3);

        let a = &root.children[0];
        assert_eq!(a.key, "cache_a");
        assert_eq!(a.source.as_deref(), Some("./cache"));
        assert_eq!(a.evaluator.variable("cluster_id"), Some(&Value::from("demo-a")));
        assert_eq!(
            root.children[1].evaluator.variable("cluster_id"),
            Some(&Value::from("demo-b"))
        );
    }

    #[test]
    fn test_manifest_resolves_remote_modules() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "main.tf",
            "module \"vpc\" {\n  source = \"terraform-aws-modules/vpc/aws\"\n}\n",
        );
        write(
            temp.path(),
            ".terraform/modules/modules.json",
            r#"{"Modules":[{"Key":"","Source":"","Dir":"."},{"Key":"vpc","Source":"terraform-aws-modules/vpc/aws","Dir":".terraform/modules/vpc"}]}"#,
        );
        write(
            temp.path(),
            ".terraform/modules/vpc/main.tf",
            "resource \"aws_security_group\" \"default\" {}\n",
        );

        let root = ModuleLoader::new(LoaderOptions::default()).load(temp.path()).unwrap();
        assert_eq!(root.children.len(), 1);
        assert!(root.children[0].has_resources("aws_security_group"));
    }

    #[test]
    fn test_missing_and_ignored_modules_are_skipped() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "main.tf",
            r#"
module "remote" {
  source = "github.com/example/module"
}
module "ignored" {
  source = "./ignored"
}
"#,
        );
        write(temp.path(), "ignored/main.tf", "");

        let options = LoaderOptions {
            ignore_modules: vec!["./ignored".to_string()],
            ..Default::default()
        };
        let root = ModuleLoader::new(options).load(temp.path()).unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_self_referencing_module_is_not_reentered() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "main.tf", "module \"self\" {\n  source = \"./\"\n}\n");

        let root = ModuleLoader::new(LoaderOptions::default()).load(temp.path()).unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_provider_block_lookup() {
        let file = ConfigFile::parse("main.tf", "provider \"aws\" {\n  region = \"us-east-1\"\n}\n").unwrap();
        let module = Module::from_files("", vec![file], Evaluator::new());
        let provider = module.provider("aws").unwrap();
        assert!(provider.has_attribute("region"));
        assert!(module.provider("google").is_none());
    }
}
