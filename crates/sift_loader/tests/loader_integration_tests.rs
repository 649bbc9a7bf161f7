//! Integration tests for loading module trees from disk.

use std::fs;
use std::path::Path;

use sift_loader::{LoadError, LoaderOptions, ModuleLoader, Value};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_nested_modules_compose_keys_and_values() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "main.tf",
        r#"variable "env" {
  default = "prod"
}

locals {
  prefix = "${var.env}-app"
}

module "network" {
  source = "./network"
  name   = local.prefix
}
"#,
    );
    write(
        dir.path(),
        "network/main.tf",
        r#"variable "name" {}

module "subnets" {
  source = "./subnets"
  label  = "${var.name}-subnet"
}
"#,
    );
    write(
        dir.path(),
        "network/subnets/main.tf",
        r#"variable "label" {}

resource "aws_subnet" "main" {
  tags = { Name = var.label }
}
"#,
    );

    let root = ModuleLoader::new(LoaderOptions::default())
        .load(dir.path())
        .unwrap();

    assert_eq!(root.count(), 3);
    let network = &root.children[0];
    assert_eq!(network.key, "network");
    assert_eq!(network.evaluator.variable("name"), Some(&Value::from("prod-app")));

    let subnets = &network.children[0];
    assert_eq!(subnets.key, "network.subnets");
    assert_eq!(subnets.display_name(), "network.subnets");
    assert_eq!(
        subnets.evaluator.variable("label"),
        Some(&Value::from("prod-app-subnet"))
    );
    assert!(subnets.has_resources("aws_subnet"));
    assert!(!root.has_resources("aws_subnet"));
}

#[test]
fn test_varfile_values_reach_child_modules() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "main.tf",
        r#"variable "instance_type" {}

module "web" {
  source        = "./web"
  instance_type = var.instance_type
}
"#,
    );
    write(dir.path(), "web/main.tf", "variable \"instance_type\" {}\n");
    write(dir.path(), "prod.tfvars", "instance_type = \"m4.large\"\n");

    let options = LoaderOptions {
        varfiles: vec![dir.path().join("prod.tfvars")],
        ignore_modules: Vec::new(),
    };
    let root = ModuleLoader::new(options).load(dir.path()).unwrap();

    assert_eq!(
        root.children[0].evaluator.variable("instance_type"),
        Some(&Value::from("m4.large"))
    );
}

#[test]
fn test_syntax_error_names_the_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "broken.tf", "resource \"aws_instance\" \"web\" {\n");

    let err = ModuleLoader::new(LoaderOptions::default())
        .load(dir.path())
        .unwrap_err();
    match err {
        LoadError::Parse { file, .. } => assert!(file.ends_with("broken.tf")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_requires_directory() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    let err = ModuleLoader::new(LoaderOptions::default())
        .load(&missing)
        .unwrap_err();
    assert!(matches!(err, LoadError::NotADirectory(_)));
}
