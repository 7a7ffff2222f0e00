use clap::{Arg, ArgAction, Command};
use scrap_compiler::options::CompileOptions;
use scrap_runner::entry::{self, ResolveError};
use scrap_runner::loader::LoadedModule;
use scrap_runner::runner;
use scrap_compiler::image::Program;

fn main() {
    let exit_code = (|| {
        // Parse arguments using Clap
        let matches = Command::new("scrap-runner")
            .about("Compile a Scrap snippet in memory and invoke its entry point")
            .arg(
                Arg::new("source")
                    .value_name("SOURCE")
                    .help("Snippet source text"),
            )
            .arg(
                Arg::new("file")
                    .short('f')
                    .long("file")
                    .value_name("PATH")
                    .help("Read the snippet from a file")
                    .conflicts_with("source"),
            )
            .arg(
                Arg::new("dump-module")
                    .long("dump-module")
                    .help("Print the compiled module listing and exit without executing")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("imports")
                    .short('i')
                    .long("import")
                    .value_name("NS")
                    .help("Open an additional builtin namespace")
                    .action(ArgAction::Append),
            )
            .arg(
                Arg::new("deny-unsafe")
                    .long("deny-unsafe")
                    .help("Reject unsafe blocks in the snippet")
                    .action(ArgAction::SetTrue),
            )
            .group(
                clap::ArgGroup::new("input")
                    .args(["source", "file"])
                    .required(true),
            )
            .get_matches();

        let mut options = CompileOptions::default();
        if matches.get_flag("deny-unsafe") {
            options.allow_unsafe_constructs = false;
        }
        if let Some(imports) = matches.get_many::<String>("imports") {
            // Malformed namespaces surface as E_BAD_USING diagnostics.
            for ns in imports {
                options.implicit_imports.insert(ns.clone());
            }
        }

        let (source, file) = if let Some(path) = matches.get_one::<String>("file") {
            match runner::read_snippet_file(path) {
                Ok(source) => (source, path.clone()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return 1;
                }
            }
        } else {
            let source = matches
                .get_one::<String>("source")
                .cloned()
                .unwrap_or_default();
            (source, "<snippet>".to_string())
        };

        if matches.get_flag("dump-module") {
            return dump_module(&source, &file, &options);
        }

        let mut stdout = std::io::stdout();
        match runner::run_with_file(&source, &file, &options, &mut stdout) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    })();

    std::process::exit(exit_code);
}

// --dump-module: compile, then print a textual module listing.
fn dump_module(source: &str, file: &str, options: &CompileOptions) -> i32 {
    if source.trim().is_empty() {
        eprintln!("Error: no snippet source supplied");
        return 1;
    }

    let compiled = match scrap_compiler::compile_with_file(source, file, options) {
        Ok(compiled) => compiled,
        Err(diags) => {
            eprintln!(
                "Error: compilation failed:\n{}",
                scrap_compiler::diagnostics::render_all(&diags)
            );
            return 1;
        }
    };
    for warning in compiled.warnings() {
        eprintln!("{}", warning);
    }

    let module = match LoadedModule::from_image(compiled.image()) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    print_module(module.program());
    0
}

fn print_module(program: &Program) {
    println!("module {} ({})", program.format, program.kind);
    for class in &program.classes {
        println!();
        println!("class {}", class.name);
        for field in &class.fields {
            println!("  field {} {}", field.ty, field.name);
        }
        for ctor in &class.ctors {
            println!("  ctor ({})", format_params(ctor));
        }
        for routine in &class.routines {
            println!(
                "  routine {}({}) -> {}",
                routine.name,
                format_params(routine),
                routine.ret
            );
        }
    }

    println!();
    match entry::resolve(program) {
        Ok(resolved) => println!("entry: {}", resolved.describe()),
        Err(ResolveError::NotFound) => println!("entry: <none>"),
        Err(ResolveError::Ambiguous(candidates)) => {
            println!("entry: <ambiguous: {}>", candidates.join(", "))
        }
    }
}

fn format_params(routine: &scrap_compiler::image::RoutineDef) -> String {
    routine
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect::<Vec<_>>()
        .join(", ")
}
