//! `regionforge init` — project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::RegionforgeManifest;

const REGIONS: &str = "# One region identifier per line.\nus-east-1\n";

const BASE_TEMPLATE: &str = r#"packer {
  required_plugins {
    amazon = {
      source  = "github.com/hashicorp/amazon"
      version = ">= 1.2.0"
    }
  }
}

locals {
  timestamp = regex_replace(timestamp(), "[- TZ:]", "")
}
"#;

const NETWORK_TEMPLATE: &str = r#"source "amazon-ebs" "__NETWORK__-${AWS_REGION}" {
  region        = "${AWS_REGION}"
  ami_name      = "node-__NETWORK__-${NODE_VERSION}-${local.timestamp}"
  instance_type = "t3.small"
  ssh_username  = "ubuntu"

  source_ami_filter {
    filters = {
      name                = "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-*"
      root-device-type    = "ebs"
      virtualization-type = "hvm"
    }
    owners      = ["099720109477"]
    most_recent = true
  }
}

build {
  name    = "__NETWORK__-${AWS_REGION}"
  sources = ["source.amazon-ebs.__NETWORK__-${AWS_REGION}"]

  provisioner "shell" {
    inline = ["echo installing __NETWORK__ node ${NODE_VERSION}"]
  }
}
"#;

/// Create a new project in directory `name`, relative to cwd.
pub fn run(name: &str) -> Result<()> {
    create_project(Path::new(name), name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir.join("templates"))
        .context("creating templates/ directory")?;

    fs::write(
        project_dir.join("regionforge.toml"),
        RegionforgeManifest::template(name),
    )
    .context("writing regionforge.toml")?;
    fs::write(project_dir.join("regions.txt"), REGIONS).context("writing regions.txt")?;
    fs::write(project_dir.join("templates/base.pkr.hcl"), BASE_TEMPLATE)
        .context("writing templates/base.pkr.hcl")?;
    for network in ["mainnet", "testnet"] {
        let path = project_dir.join(format!("templates/{network}.pkr.hcl"));
        fs::write(&path, NETWORK_TEMPLATE.replace("__NETWORK__", network))
            .with_context(|| format!("writing {}", path.display()))?;
    }
    fs::write(
        project_dir.join(".gitignore"),
        "build.pkr.hcl\n.regionforge-staging/\n",
    )
    .context("writing .gitignore")?;

    println!("Created project '{name}'");
    println!("  {name}/regionforge.toml");
    println!("  {name}/regions.txt");
    println!("  {name}/templates/base.pkr.hcl");
    println!("  {name}/templates/mainnet.pkr.hcl");
    println!("  {name}/templates/testnet.pkr.hcl");
    println!("  {name}/.gitignore");

    Ok(())
}
