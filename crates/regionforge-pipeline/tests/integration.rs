//! End-to-end runs of the pipeline against a scripted tool.

use std::fs;
use std::path::{Path, PathBuf};

use regionforge_pipeline::{
    BuildOutcome, ImageTool, Network, Phase, Pipeline, PipelineConfig, PipelineError, RegionList,
    ToolStep,
};
use regionforge_template::{Environment, SubstOptions, Substituter};

/// Records every invocation; validation fails when the artifact contains
/// `INVALID`.
#[derive(Default)]
struct RecordingTool {
    calls: Vec<(ToolStep, PathBuf)>,
}

impl RecordingTool {
    fn count(&self, step: ToolStep) -> usize {
        self.calls.iter().filter(|(s, _)| *s == step).count()
    }
}

impl ImageTool for RecordingTool {
    fn validate(&mut self, artifact: &Path) -> regionforge_pipeline::Result<()> {
        self.calls.push((ToolStep::Validate, artifact.to_path_buf()));
        let text = fs::read_to_string(artifact).unwrap();
        if text.contains("INVALID") {
            return Err(PipelineError::ToolFailed {
                program: "packer".into(),
                step: ToolStep::Validate,
                code: Some(1),
            });
        }
        Ok(())
    }

    fn build(&mut self, artifact: &Path) -> regionforge_pipeline::Result<()> {
        self.calls.push((ToolStep::Build, artifact.to_path_buf()));
        Ok(())
    }
}

const MAINNET: &str = "source \"amazon-ebs\" \"mainnet-${AWS_REGION}\" {\n  region = \"$AWS_REGION\"\n}";
const TESTNET: &str = "source \"amazon-ebs\" \"testnet-${AWS_REGION}\" {\n  region = \"$AWS_REGION\"\n}\n";
const BASE: &str = "build {\n  name = \"node-$NODE_VERSION\"\n  sources = [\"${var.sources}\"]\n}\n";

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new(regions: &str, base: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir(&templates).unwrap();
        fs::write(templates.join("mainnet.pkr.hcl"), MAINNET).unwrap();
        fs::write(templates.join("testnet.pkr.hcl"), TESTNET).unwrap();
        fs::write(templates.join("base.pkr.hcl"), base).unwrap();
        fs::write(dir.path().join("regions.txt"), regions).unwrap();
        Project { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self, build: bool) -> PipelineConfig {
        let root = self.root();
        PipelineConfig {
            regions: RegionList::load(&root.join("regions.txt")).unwrap(),
            networks: Network::defaults(&root.join("templates")),
            base_template: root.join("templates/base.pkr.hcl"),
            staging_dir: root.join(".staging"),
            artifact: root.join("build.pkr.hcl"),
            region_var: "AWS_REGION".into(),
            build,
        }
    }
}

fn substituter() -> Substituter {
    let env: Environment = [("NODE_VERSION", "0.9.1")].into_iter().collect();
    Substituter::new(env, SubstOptions::default())
}

#[test]
fn staged_pairs_match_region_count() {
    let project = Project::new("us-east-1\neu-west-1\nap-northeast-1\n", BASE);
    let cfg = project.config(false);
    let sub = substituter();

    let output = Pipeline::new(&cfg, &sub).render().unwrap();
    assert_eq!(output.staged.len(), 2 * 3);
    let mut names: Vec<_> = output
        .staged
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 6);
    assert!(names.contains(&"testnet-ap-northeast-1.pkr.hcl".to_string()));
}

#[test]
fn artifact_contains_regions_then_base_in_merge_order() {
    let project = Project::new("us-east-1\neu-west-1\n", BASE);
    let cfg = project.config(false);
    let sub = substituter();

    Pipeline::new(&cfg, &sub).render().unwrap();
    let artifact = fs::read_to_string(&cfg.artifact).unwrap();

    let pos = |needle: &str| {
        artifact
            .find(needle)
            .unwrap_or_else(|| panic!("missing {needle}"))
    };
    // Lexicographic file order: mainnet-eu, mainnet-us, testnet-eu, testnet-us, base.
    let order = [
        pos("\"mainnet-eu-west-1\""),
        pos("\"mainnet-us-east-1\""),
        pos("\"testnet-eu-west-1\""),
        pos("\"testnet-us-east-1\""),
        pos("build {"),
    ];
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{artifact}");

    // Unterminated mainnet template got a newline before the next part.
    assert!(artifact.contains("}\nsource \"amazon-ebs\" \"mainnet-us-east-1\""));
    // Final pass substituted the base; HCL interpolation untouched.
    assert!(artifact.contains("name = \"node-0.9.1\""));
    assert!(artifact.contains("${var.sources}"));
}

#[test]
fn transients_are_removed_and_artifact_kept() {
    let project = Project::new("us-east-1\n", BASE);
    let cfg = project.config(false);
    let sub = substituter();

    Pipeline::new(&cfg, &sub).render().unwrap();
    assert!(!cfg.staging_dir.exists());
    assert!(cfg.artifact.is_file());
    // Inputs untouched.
    assert_eq!(
        fs::read_to_string(project.root().join("templates/mainnet.pkr.hcl")).unwrap(),
        MAINNET
    );
}

#[test]
fn stale_staging_content_is_not_merged() {
    let project = Project::new("us-east-1\n", BASE);
    let cfg = project.config(false);
    fs::create_dir(&cfg.staging_dir).unwrap();
    fs::write(
        cfg.staging_dir.join("mainnet-removed-region.pkr.hcl"),
        "stale region",
    )
    .unwrap();
    let sub = substituter();

    Pipeline::new(&cfg, &sub).render().unwrap();
    let artifact = fs::read_to_string(&cfg.artifact).unwrap();
    assert!(!artifact.contains("stale region"));
}

#[test]
fn empty_region_list_yields_substituted_base() {
    let project = Project::new("# nothing yet\n", BASE);
    let cfg = project.config(false);
    let sub = substituter();

    let output = Pipeline::new(&cfg, &sub).render().unwrap();
    assert!(output.staged.is_empty());
    let artifact = fs::read_to_string(&cfg.artifact).unwrap();
    assert_eq!(artifact, sub.substitute(BASE).unwrap().text);
}

#[test]
fn unset_build_flag_skips_build() {
    let project = Project::new("us-east-1\n", BASE);
    let cfg = project.config(false);
    let sub = substituter();
    let mut tool = RecordingTool::default();

    let mut pipeline = Pipeline::new(&cfg, &sub);
    let report = pipeline.run(&mut tool).unwrap();
    assert_eq!(report.build, BuildOutcome::Skipped);
    assert_eq!(tool.count(ToolStep::Validate), 1);
    assert_eq!(tool.count(ToolStep::Build), 0);
    assert_eq!(pipeline.phase(), &Phase::Done);
}

#[test]
fn build_runs_once_after_validation() {
    let project = Project::new("us-east-1\nus-west-2\n", BASE);
    let cfg = project.config(true);
    let sub = substituter();
    let mut tool = RecordingTool::default();

    let report = Pipeline::new(&cfg, &sub).run(&mut tool).unwrap();
    assert_eq!(report.build, BuildOutcome::Built);
    assert_eq!(report.staged_files, 4);
    assert_eq!(report.regions, ["us-east-1", "us-west-2"]);
    assert_eq!(
        tool.calls,
        vec![
            (ToolStep::Validate, cfg.artifact.clone()),
            (ToolStep::Build, cfg.artifact.clone()),
        ]
    );
    let on_disk = fs::read(&cfg.artifact).unwrap();
    assert_eq!(
        report.sha256,
        regionforge_pipeline::ArtifactDigest::compute(&on_disk)
    );
}

#[test]
fn failed_validation_never_builds() {
    let project = Project::new("us-east-1\n", "INVALID {\n");
    let cfg = project.config(true);
    let sub = substituter();
    let mut tool = RecordingTool::default();

    let mut pipeline = Pipeline::new(&cfg, &sub);
    let err = pipeline.run(&mut tool).unwrap_err();
    assert_ne!(err.exit_code(), 0);
    assert_eq!(tool.count(ToolStep::Validate), 1);
    assert_eq!(tool.count(ToolStep::Build), 0);
    assert_eq!(pipeline.phase(), &Phase::Failed);
    // The artifact is the durable output even when validation rejects it.
    assert!(cfg.artifact.is_file());
    assert!(!cfg.staging_dir.exists());
}

#[test]
fn missing_template_fails_before_tool() {
    let project = Project::new("us-east-1\n", BASE);
    fs::remove_file(project.root().join("templates/testnet.pkr.hcl")).unwrap();
    let cfg = project.config(true);
    let sub = substituter();
    let mut tool = RecordingTool::default();

    let err = Pipeline::new(&cfg, &sub).run(&mut tool).unwrap_err();
    assert!(matches!(err, PipelineError::Read { .. }));
    assert!(tool.calls.is_empty());
    assert!(!cfg.staging_dir.exists());
    assert!(!cfg.artifact.exists());
}

#[test]
fn strict_mode_fails_on_unset_base_variable() {
    let project = Project::new("", BASE);
    let cfg = project.config(false);
    let sub = Substituter::new(Environment::new(), SubstOptions::default().strict(true));

    let err = Pipeline::new(&cfg, &sub).render().unwrap_err();
    assert!(err.to_string().contains("NODE_VERSION"));
    // The final pass works on the merged text, so the error names the artifact.
    match err {
        PipelineError::Template { path, .. } => assert_eq!(path, cfg.artifact),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_regions_rewrite_identical_files() {
    let project = Project::new("us-east-1\nus-east-1\n", BASE);
    let cfg = project.config(false);
    let sub = substituter();

    let output = Pipeline::new(&cfg, &sub).render().unwrap();
    assert_eq!(output.staged.len(), 4);
    let artifact = fs::read_to_string(&cfg.artifact).unwrap();
    assert_eq!(artifact.matches("\"mainnet-us-east-1\"").count(), 1);
}
