//! Tekton bundle patching for testing `jvm-build-service` pull requests.
//!
//! The default Java pipeline is pulled from its bundle, its `s2i-java` task
//! is pointed at a bundle carrying the pull request's request processor
//! image, and both are pushed under tags derived from the pull request SHA.

use std::{fs, path::Path, process::Command};

use anyhow::{Context as _, Result, bail};
use base64::{Engine as _, prelude::BASE64_STANDARD};
use serde::Deserialize;
use serde_yaml::Value;

use crate::app::CommandExt as _;

pub const BUILD_PIPELINE_SELECTOR_URL: &str = "https://raw.githubusercontent.com/redhat-appstudio/infra-deployments/main/components/build-service/base/build-pipeline-selector.yaml";
pub const DEFAULT_IMAGE_PUSH_REPO: &str = "quay.io/redhat-appstudio-qe/test-images";

const JAVA_SELECTOR: &str = "Java";
const JAVA_PIPELINE: &str = "java-builder";
const S2I_JAVA_TASK: &str = "s2i-java";
const SBOM_STEP: &str = "analyse-dependencies-java-sbom";

#[derive(Deserialize)]
struct BuildPipelineSelector {
    spec: SelectorSpec,
}

#[derive(Deserialize)]
struct SelectorSpec {
    #[serde(default)]
    selectors: Vec<Selector>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Selector {
    name: String,
    pipeline_ref: PipelineRef,
}

#[derive(Deserialize)]
struct PipelineRef {
    #[serde(default)]
    bundle: String,
}

/// Bundle of the pipeline the selector named `name` picks.
pub fn default_bundle_ref(selector_yaml: &str, name: &str) -> Result<String> {
    let selector: BuildPipelineSelector =
        serde_yaml::from_str(selector_yaml).context("Invalid build pipeline selector")?;
    match selector.spec.selectors.into_iter().find(|selector| selector.name == name) {
        Some(selector) if !selector.pipeline_ref.bundle.is_empty() => {
            Ok(selector.pipeline_ref.bundle)
        }
        Some(_) => bail!("Selector {name} does not reference a bundle"),
        None => bail!("No selector named {name} in the build pipeline selector"),
    }
}

fn sequence_mut<'a>(object: &'a mut Value, field: &str) -> Result<&'a mut Vec<Value>> {
    object
        .get_mut("spec")
        .and_then(|spec| spec.get_mut(field))
        .and_then(Value::as_sequence_mut)
        .with_context(|| format!("Object has no spec.{field}"))
}

/// Point the task ref named `task` at `bundle`, returning the bundle it had.
pub fn retarget_task(pipeline: &mut Value, task: &str, bundle: &str) -> Result<String> {
    let mut previous = None;
    for entry in sequence_mut(pipeline, "tasks")? {
        let Some(task_ref) = entry.get_mut("taskRef") else {
            continue;
        };
        if task_ref.get("name").and_then(Value::as_str) != Some(task) {
            continue;
        }
        previous = task_ref
            .get("bundle")
            .and_then(Value::as_str)
            .map(str::to_owned);
        task_ref["bundle"] = Value::from(bundle);
    }
    previous.with_context(|| format!("Pipeline has no task referencing {task} from a bundle"))
}

/// Swap the image of the step named `step`.
pub fn replace_step_image(task: &mut Value, step: &str, image: &str) -> Result<()> {
    let mut found = false;
    for entry in sequence_mut(task, "steps")? {
        if entry.get("name").and_then(Value::as_str) == Some(step) {
            entry["image"] = Value::from(image);
            found = true;
        }
    }
    if !found {
        bail!("Task has no step named {step}");
    }
    Ok(())
}

/// Write the registry credentials `tkn` pushes with.
///
/// `token` is a base64 encoded docker `config.json`.
pub fn write_docker_config(token: &str, home: &Path) -> Result<()> {
    let config = BASE64_STANDARD
        .decode(token.trim())
        .context("QUAY_TOKEN is not valid base64")?;
    let dir = home.join(".docker");
    fs::create_dir_all(&dir).with_context(|| format!("Could not create {}", dir.display()))?;
    fs::write(dir.join("config.json"), config).context("Could not write the docker config")
}

/// Fetch one object of a bundle as YAML.
fn pull_object(bundle: &str, kind: &str, name: &str) -> Result<Value> {
    let yaml = Command::new("tkn")
        .args(["bundle", "list", bundle, kind, name, "-o", "yaml"])
        .check_output()?;
    serde_yaml::from_str(&yaml).with_context(|| format!("Invalid {kind} {name} in {bundle}"))
}

fn push_object(bundle: &str, object: &Value) -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("object.yaml");
    fs::write(&file, serde_yaml::to_string(object)?)?;
    Command::new("tkn")
        .args(["bundle", "push", bundle, "-f"])
        .arg(&file)
        .wait(format!("Pushing {bundle}"))
}

/// Inputs of a Java bundle patch.
#[derive(Clone, Debug)]
pub struct JavaPatch {
    /// SHA of the pull request, used in the pushed tags.
    pub sha: String,
    pub reqprocessor_image: String,
    pub push_repo: String,
}

impl JavaPatch {
    pub fn task_bundle(&self) -> String {
        format!("{}:task-bundle-{}", self.push_repo, self.sha)
    }

    pub fn pipeline_bundle(&self) -> String {
        format!("{}:pipeline-bundle-{}", self.push_repo, self.sha)
    }

    /// Patch and push both bundles, returning the new pipeline bundle.
    pub fn run(&self, selector_yaml: &str) -> Result<String> {
        let default_bundle = default_bundle_ref(selector_yaml, JAVA_SELECTOR)?;
        info!("Patching {JAVA_PIPELINE} from {default_bundle}");

        let mut pipeline = pull_object(&default_bundle, "pipeline", JAVA_PIPELINE)?;
        let task_bundle = self.task_bundle();
        let current_task_bundle = retarget_task(&mut pipeline, S2I_JAVA_TASK, &task_bundle)?;

        let mut task = pull_object(&current_task_bundle, "task", S2I_JAVA_TASK)?;
        replace_step_image(&mut task, SBOM_STEP, &self.reqprocessor_image)?;

        push_object(&task_bundle, &task)?;
        let pipeline_bundle = self.pipeline_bundle();
        push_object(&pipeline_bundle, &pipeline)?;
        success!("Pushed {pipeline_bundle}");
        Ok(pipeline_bundle)
    }
}

/// Command line inputs of [`JavaPatch`].
#[derive(clap::Args, Clone, Debug)]
pub struct JavaPatchArgs {
    /// Image of the request processor the SBOM step runs
    #[arg(long, env = "JVM_BUILD_SERVICE_REQPROCESSOR_IMAGE", default_value = "")]
    pub reqprocessor_image: String,

    /// Base64 encoded docker config with push access to the push repository
    #[arg(long, env = "QUAY_TOKEN", default_value = "", hide_env_values = true)]
    pub quay_token: String,

    /// Repository the patched bundles are pushed to
    #[arg(long, default_value = DEFAULT_IMAGE_PUSH_REPO)]
    pub push_repo: String,

    /// Build pipeline selector naming the default Java pipeline bundle
    #[arg(long, default_value = BUILD_PIPELINE_SELECTOR_URL)]
    pub selector_url: String,
}

impl JavaPatchArgs {
    /// Patch the bundles for the commit `sha`, returning the pipeline bundle.
    pub fn run(&self, sha: &str) -> Result<String> {
        if self.reqprocessor_image.is_empty() {
            bail!("JVM_BUILD_SERVICE_REQPROCESSOR_IMAGE is required to patch the Java bundles");
        }
        if self.quay_token.is_empty() {
            bail!("QUAY_TOKEN is required to push the Java bundles");
        }
        let home = std::env::var_os("HOME").context("HOME is not set")?;
        write_docker_config(&self.quay_token, Path::new(&home))?;

        let selector = crate::app::block_on(fetch_selector(&self.selector_url))??;
        JavaPatch {
            sha: sha.to_owned(),
            reqprocessor_image: self.reqprocessor_image.clone(),
            push_repo: self.push_repo.clone(),
        }
        .run(&selector)
    }
}

/// Fetch the build pipeline selector.
pub async fn fetch_selector(url: &str) -> Result<String> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Could not fetch {url}"))?
        .error_for_status()?;
    Ok(response.text().await?)
}
