//! napidl command line.
//!
//! Generates a C++ N-API translation unit from a WebIDL document.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use miette::IntoDiagnostic;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use tracing_subscriber::EnvFilter;

use napidl_compiler::codegen::runtime;
use napidl_compiler::{CompileResult, Compiler, CompilerConfig, SourceFormat};

mod ui;

#[derive(Parser)]
#[command(name = "napidl")]
#[command(about = "Generates N-API C++ bindings from WebIDL")]
#[command(version)]
struct Cli {
    /// WebIDL document (.idl text or webidl2 .json)
    #[arg(required_unless_present = "include_dir")]
    input: Option<PathBuf>,

    /// Output file (default: the input path with a .cc extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra header included after the support header (repeatable)
    #[arg(short = 'i', long = "include")]
    includes: Vec<String>,

    /// N-API header included first
    #[arg(short = 'n', long, default_value = "js_native_api.h")]
    napi_header: String,

    /// Prefix of the generated <module>_init function
    #[arg(long)]
    module_name: Option<String>,

    /// Input format (default: picked from the input extension)
    #[arg(long, value_parser = SourceFormat::from_name)]
    format: Option<SourceFormat>,

    /// Emit NAPI_MODULE_INIT() calling the init function
    #[arg(long)]
    register_module: bool,

    /// Write webidl-napi.h next to the output file
    #[arg(long)]
    write_support_header: bool,

    /// Run the pipeline without writing anything
    #[arg(long, conflicts_with = "watch")]
    check: bool,

    /// Regenerate whenever the input changes
    #[arg(long)]
    watch: bool,

    /// Print the directory holding webidl-napi.h and exit
    #[arg(short = 'I', long)]
    include_dir: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self, input: PathBuf) -> CompilerConfig {
        CompilerConfig {
            input,
            output: self.output.clone(),
            module_name: self.module_name.clone(),
            napi_header: self.napi_header.clone(),
            extra_includes: self.includes.clone(),
            format: self.format,
            register_module: self.register_module,
            write_support_header: self.write_support_header,
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.include_dir {
        println!("{}", runtime::include_dir().display());
        return Ok(());
    }

    let Some(input) = cli.input.clone() else {
        return Err(miette::miette!("no input file given"));
    };
    let compiler = Compiler::new(cli.config(input));

    if cli.check {
        check(&compiler)
    } else if cli.watch {
        // A failing first run still enters the watch loop.
        if let Err(e) = compile(&compiler) {
            ui::error(&format!("{}", e));
        }
        println!();
        run_watch_mode(&compiler).await
    } else {
        compile(&compiler)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("napidl=debug")
    } else {
        EnvFilter::try_from_env("NAPIDL_LOG").unwrap_or_else(|_| EnvFilter::new("napidl=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn compile(compiler: &Compiler) -> miette::Result<()> {
    let start = Instant::now();
    let spinner = ui::spinner(&format!(
        "Generating bindings for {}...",
        compiler.config().input.display()
    ));

    let result = compiler.compile();
    spinner.finish_and_clear();
    let result = result?;

    report(&result);
    ui::timing("Done", start.elapsed().as_millis());
    Ok(())
}

fn check(compiler: &Compiler) -> miette::Result<()> {
    let spinner = ui::spinner(&format!("Checking {}...", compiler.config().input.display()));
    let result = compiler.check();
    spinner.finish_and_clear();
    let result = result?;

    report(&result);
    ui::success("Looking good.");
    Ok(())
}

fn report(result: &CompileResult) {
    ui::info(&ui::counts(
        result.interfaces,
        result.dictionaries,
        result.enums,
        result.typedefs,
    ));
    for path in &result.written {
        ui::success(&format!("Wrote {}", path.display()));
    }
    for warning in &result.warnings {
        ui::warning(warning);
    }
    if !result.unsupported.is_empty() {
        ui::warning(&format!(
            "{} construct(s) will throw \"not implemented\":",
            result.unsupported.len()
        ));
        for construct in &result.unsupported {
            ui::dim(&format!("    {}", construct));
        }
    }
}

/// Regenerates on every debounced change to the input until Ctrl-C.
async fn run_watch_mode(compiler: &Compiler) -> miette::Result<()> {
    let input = compiler.config().input.clone();
    ui::info(&format!("Watching {} for changes", input.display()));
    println!();

    // Channel for file change events
    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);

    // Editors often replace the file, so watch its directory and filter by name.
    let file_name: Option<OsString> = input.file_name().map(|n| n.to_os_string());
    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |result: DebounceEventResult| {
            if let Ok(events) = result {
                if events
                    .iter()
                    .any(|event| event.path.file_name() == file_name.as_deref())
                {
                    let _ = tx.try_send(());
                }
            }
        },
    )
    .into_diagnostic()?;

    debouncer
        .watcher()
        .watch(watch_dir(&input), RecursiveMode::NonRecursive)
        .into_diagnostic()?;

    ui::info("Ready! Waiting for changes...");

    loop {
        tokio::select! {
            _ = rx.recv() => {
                println!();
                let spinner = ui::spinner("Change detected, regenerating...");
                let start = Instant::now();

                match compiler.compile() {
                    Ok(result) => {
                        spinner.finish_and_clear();
                        let duration = start.elapsed().as_millis();
                        ui::success(&format!(
                            "Generated {} in {}ms",
                            ui::counts(result.interfaces, result.dictionaries, result.enums, result.typedefs),
                            duration
                        ));
                        for warning in &result.warnings {
                            ui::warning(warning);
                        }
                    }
                    Err(e) => {
                        spinner.finish_and_clear();
                        ui::error(&format!("{}", e));
                    }
                }
                println!();
                ui::info("Ready! Waiting for changes...");
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                ui::dim("Stopping watch mode.");
                break;
            }
        }
    }

    Ok(())
}

fn watch_dir(input: &Path) -> &Path {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
