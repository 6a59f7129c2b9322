//! Command line driver: parses one markup file through the default pipeline and prints the
//! produced elements.
//!
//! Usage:
//!   tagflow [--css FILE]... [--root DIR]... [--base URL]... [--continue] FILE

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use css::{CssFileProcessor, CssFiles};
use pipeline::{
    ElementCollector, ResourceError, ResourceLocator, ResourceProvider, Worker, WorkerConfig,
    default_pipeline,
};
use url::Url;

/// Reads references from the local file system. `file:` URLs are accepted; other URLs are
/// reported as not found.
#[derive(Debug)]
struct FsProvider;

impl ResourceProvider for FsProvider {
    fn retrieve(&self, reference: &str) -> Result<Vec<u8>, ResourceError> {
        let path = match Url::parse(reference) {
            Ok(url) if url.scheme() == "file" => {
                url.to_file_path().map_err(|()| ResourceError::InvalidReference {
                    reference: reference.to_string(),
                })?
            }
            Ok(_) => {
                return Err(ResourceError::NotFound {
                    reference: reference.to_string(),
                });
            }
            Err(_) => PathBuf::from(reference),
        };
        fs::read(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ResourceError::NotFound {
                reference: reference.to_string(),
            },
            _ => ResourceError::Io {
                reference: reference.to_string(),
                message: err.to_string(),
            },
        })
    }
}

#[derive(Debug, Default)]
struct Args {
    input: Option<PathBuf>,
    stylesheets: Vec<PathBuf>,
    config: WorkerConfig,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().ok_or_else(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "--css" => args.stylesheets.push(PathBuf::from(value("--css")?)),
            "--root" => args.config.resource_roots.push(PathBuf::from(value("--root")?)),
            "--base" => {
                let raw = value("--base")?;
                let url = Url::parse(&raw).map_err(|err| format!("invalid base URL {raw}: {err}"))?;
                args.config.base_urls.push(url);
            }
            "--continue" => args.config.continue_on_element_error = true,
            other if other.starts_with("--") => return Err(format!("unknown option {other}")),
            other => {
                if args.input.replace(PathBuf::from(other)).is_some() {
                    return Err("only one input file is accepted".to_string());
                }
            }
        }
    }
    Ok(args)
}

fn load_stylesheets(paths: &[PathBuf], charset: &str) -> io::Result<CssFiles> {
    let mut files = CssFiles::new();
    for path in paths {
        let bytes = fs::read(path)?;
        let mut processor = CssFileProcessor::new(false);
        processor.push_bytes(&bytes, Some(charset));
        let file = processor.finish();
        log::info!(target: "tagflow", "{}: {} rule entries", path.display(), file.len());
        files.add(file);
    }
    Ok(files)
}

fn run(args: Args) -> Result<(), String> {
    let input_path = args.input.ok_or("no input file given")?;
    let input = fs::read_to_string(&input_path)
        .map_err(|err| format!("cannot read {}: {err}", input_path.display()))?;
    let files = load_stylesheets(&args.stylesheets, &args.config.default_charset)
        .map_err(|err| format!("cannot read stylesheet: {err}"))?;

    let mut config = args.config;
    if let Some(dir) = input_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        config.resource_roots.push(dir.to_path_buf());
    }

    let collector = ElementCollector::new();
    let locator = ResourceLocator::from_config(FsProvider, &config);
    let pipeline = default_pipeline(&config, files, collector.clone(), Some(locator));
    let report = Worker::new(&config, pipeline)
        .and_then(|mut worker| worker.parse(&input))
        .map_err(|err| err.to_string())?;

    for element in collector.take() {
        println!("{element:#?}");
    }
    log::info!(target: "tagflow", "{} tags processed", report.tags);
    for rejected in &report.rejected {
        eprintln!("rejected {}: {}", rejected.kind, rejected.reason);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match parse_args().and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("tagflow: {message}");
            ExitCode::FAILURE
        }
    }
}
