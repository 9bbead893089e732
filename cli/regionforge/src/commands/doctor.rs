//! `regionforge doctor` — tool and project diagnostics.

use std::process::Command;

use anyhow::Result;
use regionforge_pipeline::RegionList;
use regionforge_template::Environment;

use crate::manifest::MANIFEST_FILE;
use crate::project::Project;

/// Print diagnostic information. Never fails on a broken project; problems
/// are reported in the output instead.
pub fn run(project: &Project) -> Result<()> {
    println!("=== regionforge doctor ===");
    println!();

    println!("regionforge version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- External Tool ---");
    print_tool_status(&project.manifest.tool.program, &["version"]);
    println!();

    println!("--- Project Status ---");
    println!("  Directory: {}", project.dir.display());
    if project.has_manifest {
        println!("  {MANIFEST_FILE}: found");
    } else {
        println!("  {MANIFEST_FILE}: not found (using defaults)");
    }
    if let Some(name) = project.manifest.project_name() {
        println!("  Project:   {name}");
    }

    let regions_path = project.regions_path();
    match RegionList::load(&regions_path) {
        Ok(regions) => println!(
            "  Regions:   {} ({})",
            regions.len(),
            regions_path.display()
        ),
        Err(e) => println!("  Regions:   error — {e}"),
    }

    for network in project.networks() {
        print_input_status(&format!("Template[{}]", network.name), &network.template);
    }
    print_input_status("Base", &project.resolve(&project.manifest.inputs.base));
    println!();

    println!("--- Environment ---");
    let env = Environment::from_process();
    let flag_var = &project.manifest.env.build_flag_var;
    println!(
        "  {flag_var}: {}",
        if env.is_set_non_empty(flag_var) {
            "set (build will run)"
        } else {
            "unset (build will be skipped)"
        }
    );
    println!(
        "  Region variable: {}",
        project.manifest.env.region_var
    );

    Ok(())
}

fn print_input_status(label: &str, path: &std::path::Path) {
    let state = if path.is_file() { "ok" } else { "missing" };
    println!("  {label}: {state} ({})", path.display());
}

fn print_tool_status(name: &str, args: &[&str]) {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first_line = version.lines().next().unwrap_or("(unknown version)");
            println!("  {name}: {first_line}");
        }
        Err(_) => {
            println!("  {name}: not found");
        }
    }
}
