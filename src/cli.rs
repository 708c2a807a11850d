//! Demonstration CLI: raw description → JSON Schema
use std::path::PathBuf;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, Args};
use log::info;
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile terse schema descriptions (JSON) into JSON Schema documents
#[derive(Parser, Debug)]
#[command(name = "tjsg")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile one or more description files
    Compile(CompileOut),
    /// resolve a type name (e.g. `number_or_null_array`) and print its schema
    Lookup(LookupOut),
    /// compile the built-in sample description
    Demo(DemoOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the description inside each document (e.g. /definitions/sample)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is compiled separately
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// mark every property at every inline object level as required
    #[arg(long, default_value_t = false)]
    require_all: bool,

    /// output .json file (stdout if omitted); multiple results are written as a JSON array
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct LookupOut {
    /// factory name such as `string`, `number_or_null`, `string_array`
    name: String,

    /// extra keyword as `key=value`; value is parsed as JSON, else taken as a string
    #[arg(long = "keyword", short = 'k')]
    keywords: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DemoOut {
    /// mark every property at every inline object level as required
    #[arg(long, default_value_t = false)]
    require_all: bool,

    /// also print the raw description
    #[arg(long)]
    show_description: bool,
}

const DEMO_DESCRIPTION: &str = r#"{
    "sample_id": { "$type": "number_or_null", "minimum": 0 },
    "sample_names": ["string_or_null"],
    "is_public": "boolean_or_null",
    "metadata": {
        "abundance": "number",
        "names": { "gene": "string", "protein": "string" }
    },
    "datasets": [{
        "id": "number_or_null",
        "values": [{ "x": { "$type": "number", "minimum": 0 }, "y": "number" }]
    }]
}"#;

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every raw description selected from the inputs, tagged with its source.
    fn load_descriptions(&self) -> Result<Vec<(String, Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            info!("reading {source_path_str}");
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let json_value = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            let json_value = match self.json_pointer.as_deref() {
                None => json_value,
                Some(pointer) => match json_value.pointer(pointer) {
                    Some(x) => x.clone(),
                    None => bail!("JSON pointer {pointer} selects nothing in ({source_path_str})"),
                },
            };
            match self.jq_expr.as_ref() {
                None => out.push((source_path_str, json_value)),
                Some(jq_expr) => {
                    let results = crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                        format!("failed to apply jq expression to source file ({source_path_str})")
                    })?;
                    for (ix, value) in results.into_iter().enumerate() {
                        out.push((format!("{source_path_str}#{ix}"), value));
                    }
                }
            }
        }
        Ok(out)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Compile(target) => {
                let descriptions = target.input_settings.load_descriptions()?;
                let mut compiled = Vec::with_capacity(descriptions.len());
                for (source, value) in descriptions {
                    let raw = crate::path_de::raw_schema_from_value(value)
                        .with_context(|| format!("invalid schema description ({source})"))?;
                    let schema = crate::compile_schema(&raw, target.require_all)
                        .with_context(|| format!("failed to compile ({source})"))?;
                    compiled.push(schema);
                }
                let output = match compiled.len() {
                    1 => compiled.remove(0),
                    _ => Value::Array(compiled),
                };
                write_output(&output, target.out.as_ref())
            }
            Command::Lookup(target) => {
                let mut node = crate::factory::lookup(&target.name)?;
                for keyword in &target.keywords {
                    let Some((key, raw_value)) = keyword.split_once('=') else {
                        bail!("keyword `{keyword}` is not of the form key=value");
                    };
                    let value = serde_json::from_str::<Value>(raw_value)
                        .unwrap_or_else(|_| Value::from(raw_value));
                    node.set_keyword(key, value);
                }
                eprintln!("{node}");
                write_output(&node.compile(), None)
            }
            Command::Demo(target) => {
                let raw = crate::path_de::raw_schema_from_str(DEMO_DESCRIPTION)?;
                if target.show_description {
                    eprintln!("{DEMO_DESCRIPTION}");
                }
                let schema = crate::compile_schema(&raw, target.require_all)?;
                write_output(&schema, None)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(value: &Value, out: Option<&PathBuf>) -> Result<()> {
    let schema_src = serde_json::to_string_pretty(value)?;
    if let Some(out) = out {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out, &schema_src)
            .with_context(|| format!("failed to write {}", out.display()))?;
        info!("wrote {}", out.display());
    } else {
        println!("{schema_src}");
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
