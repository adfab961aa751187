use anyhow::{Context, Result, bail};
use cmdtree::AppSettings;
use cmdtree_metadata::{CommandMeta, FORMAT_VERSION, MethodMeta, ParamMeta};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST_NAME: &str = "cmdtree.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,

    #[serde(default)]
    pub settings: AppSettings,

    pub app: CommandMeta,
}

fn resolve_manifest_path(manifest_path: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(match manifest_path {
        Some(p) => resolve_against(&cwd, p),
        None => cwd.join(DEFAULT_MANIFEST_NAME),
    })
}

pub fn load_manifest(manifest_path: Option<&Path>) -> Result<Manifest> {
    let path = resolve_manifest_path(manifest_path)?;
    if !path.exists() {
        bail!("manifest not found: {}", path.display());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse manifest JSON: {}", path.display()))?;

    if let Some(version) = manifest.schema_version {
        if version > FORMAT_VERSION {
            bail!(
                "unsupported schemaVersion {version} in {} (supported: {FORMAT_VERSION})",
                path.display()
            );
        }
    }
    tracing::debug!(
        path = %path.display(),
        commands = manifest.app.command_count(),
        "loaded manifest"
    );
    Ok(manifest)
}

pub fn write_default_manifest(
    project_dir: &Path,
    name: Option<&str>,
    overwrite: bool,
) -> Result<PathBuf> {
    let dest = project_dir.join(DEFAULT_MANIFEST_NAME);
    if dest.exists() && !overwrite {
        bail!(
            "{DEFAULT_MANIFEST_NAME} already exists in {}",
            project_dir.display()
        );
    }

    let app_name = name
        .map(str::to_string)
        .or_else(|| guess_project_name(project_dir))
        .unwrap_or_else(|| "my-cli".to_string());
    let manifest = default_manifest(&app_name);

    let bytes = serde_json::to_vec_pretty(&manifest).context("failed to serialize manifest")?;
    let mut out = String::from_utf8(bytes).context("manifest is not valid UTF-8")?;
    out.push('\n');

    let tmp = dest.with_extension("tmp");
    fs::write(&tmp, out.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if overwrite && dest.exists() {
        fs::remove_file(&dest).with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    fs::rename(&tmp, &dest)
        .with_context(|| format!("failed to move {} into place", dest.display()))?;
    Ok(dest)
}

fn param(name: &str) -> ParamMeta {
    ParamMeta {
        name: name.to_string(),
        ..ParamMeta::default()
    }
}

fn default_manifest(app_name: &str) -> Manifest {
    let greet = MethodMeta {
        name: "greet".to_string(),
        description: "Greet someone".to_string(),
        params: vec![
            ParamMeta {
                positional: true,
                required: true,
                help: "Who to greet".to_string(),
                ..param("name")
            },
            ParamMeta {
                short: Some('s'),
                value_type: Some("bool".to_string()),
                help: "Greet loudly".to_string(),
                ..param("shout")
            },
        ],
        ..MethodMeta::default()
    };
    let config = CommandMeta {
        name: "config".to_string(),
        description: "Read and write settings".to_string(),
        commands: vec![
            MethodMeta {
                name: "get".to_string(),
                params: vec![ParamMeta {
                    positional: true,
                    required: true,
                    ..param("key")
                }],
                ..MethodMeta::default()
            },
            MethodMeta {
                name: "set".to_string(),
                params: vec![
                    ParamMeta {
                        positional: true,
                        required: true,
                        ..param("key")
                    },
                    ParamMeta {
                        positional: true,
                        required: true,
                        ..param("value")
                    },
                ],
                ..MethodMeta::default()
            },
        ],
        ..CommandMeta::default()
    };

    Manifest {
        schema_version: Some(FORMAT_VERSION),
        settings: AppSettings {
            show_version_option: true,
            version: Some("0.1.0".to_string()),
            ..AppSettings::default()
        },
        app: CommandMeta {
            name: app_name.to_string(),
            options: vec![ParamMeta {
                short: Some('q'),
                value_type: Some("bool".to_string()),
                help: "Suppress extra output".to_string(),
                ..param("quiet")
            }],
            commands: vec![greet],
            subcommands: vec![config],
            ..CommandMeta::default()
        },
    }
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn guess_project_name(project_dir: &Path) -> Option<String> {
    // `.` and `..` carry no name; fall back to the current directory.
    let file_name = project_dir.file_name().and_then(|s| s.to_str());
    let direct = file_name.filter(|s| !s.is_empty() && *s != "." && *s != "..");
    if let Some(name) = direct {
        return Some(name.to_string());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(|s| s.to_string())
}
