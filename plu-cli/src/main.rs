//! Command-line interface for plu
//! This binary is used to inspect / validate / import / export règlement
//! documents outside the browser editor.
//!
//! Usage:
//!   plu inspect `<doc.json>`                  - Print the titre tree
//!   plu validate `<doc.json>`                 - Check import invariants
//!   plu import `<converted.html>` [-o out]    - DOCX-converted HTML → JSON
//!   plu export `<doc.json>` -o `<dir>` [--images <dir>]
//!   plu split `<richdoc.json>`                - Preview `***` partitioning

use clap::{Arg, ArgAction, Command};
use plu_babel::export::{build_export, write_bundle, ExportOptions};
use plu_babel::formats::docx_html::{import_docx_html_with, ImportOptions};
use plu_babel::images::{ImageStore, MemoryImageStore};
use plu_babel::rich::nodes::RichDoc;
use plu_babel::split_rich_doc;
use plu_config::{Loader, PluToolConfig};
use plu_engine::tree;
use plu_model::ast::document::DocType;
use plu_model::{validation, PluDocument};
use std::fs;
use std::path::Path;
use std::process::exit;

mod sink;

fn main() {
    env_logger::init();

    let matches = Command::new("plu")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting and processing PLU règlement documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a plu.toml layered over the embedded defaults")
                .global(true),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the titre tree of a document")
                .arg(Arg::new("path").help("Path to the document JSON").required(true)),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a document against the import invariants")
                .arg(Arg::new("path").help("Path to the document JSON").required(true)),
        )
        .subcommand(
            Command::new("import")
                .about("Import DOCX-converted HTML as a document")
                .arg(Arg::new("path").help("Path to the converted HTML").required(true))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write the document JSON here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export a document as a bundle directory")
                .arg(Arg::new("path").help("Path to the document JSON").required(true))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Bundle directory to create")
                        .required(true),
                )
                .arg(
                    Arg::new("images")
                        .long("images")
                        .help("Directory of image files to load into the store"),
                ),
        )
        .subcommand(
            Command::new("split")
                .about("Preview how a rich document splits at *** separators")
                .arg(Arg::new("path").help("Path to the rich document JSON").required(true))
                .arg(
                    Arg::new("counts")
                        .long("counts")
                        .help("Print block counts instead of part summaries")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let config = load_config(matches.get_one::<String>("config"));

    match matches.subcommand() {
        Some(("inspect", sub)) => handle_inspect(arg(sub, "path")),
        Some(("validate", sub)) => handle_validate(arg(sub, "path")),
        Some(("import", sub)) => handle_import(
            arg(sub, "path"),
            sub.get_one::<String>("output"),
            &config,
        ),
        Some(("export", sub)) => handle_export(
            arg(sub, "path"),
            arg(sub, "output"),
            sub.get_one::<String>("images"),
            &config,
        ),
        Some(("split", sub)) => handle_split(arg(sub, "path"), sub.get_flag("counts")),
        _ => unreachable!("arg_required_else_help"),
    }
}

fn arg<'a>(matches: &'a clap::ArgMatches, name: &str) -> &'a String {
    matches.get_one::<String>(name).expect("required argument")
}

fn load_config(path: Option<&String>) -> PluToolConfig {
    let loader = match path {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file("plu.toml"),
    };
    loader.build().unwrap_or_else(|err| {
        eprintln!("Configuration error: {}", err);
        exit(1);
    })
}

fn read_file(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("Cannot read '{}': {}", path, err);
        exit(1);
    })
}

fn load_document(path: &str) -> PluDocument {
    PluDocument::from_json_str(&read_file(path)).unwrap_or_else(|err| {
        eprintln!("'{}' is not a valid document: {}", path, err);
        exit(1);
    })
}

/// Handle the inspect command
fn handle_inspect(path: &str) {
    let doc = load_document(path);
    println!("{} [{}]", doc.nom, doc.type_doc);
    println!("{}", doc.id_reglement);
    for entry in tree::flatten(&doc.titres) {
        let indent = "  ".repeat(entry.path.len());
        let contenus = tree::titre_at(&doc.titres, &entry.path)
            .map(|titre| titre.contenu.len())
            .unwrap_or(0);
        println!(
            "{}{} (niveau {}, {} contenus)",
            indent, entry.intitule, entry.niveau, contenus
        );
    }
}

/// Handle the validate command
fn handle_validate(path: &str) {
    let doc = load_document(path);
    match validation::validate_document(&doc) {
        Ok(()) => println!("OK: {} ({} titres)", doc.nom, doc.titre_count()),
        Err(err) => {
            eprintln!("Invalid document: {}", err);
            exit(1);
        }
    }
}

/// Handle the import command
fn handle_import(path: &str, output: Option<&String>, config: &PluToolConfig) {
    let html = read_file(path);
    let options = ImportOptions {
        default_type_doc: DocType::parse(&config.import.default_type_doc),
    };
    let doc = import_docx_html_with(&html, &options).unwrap_or_else(|err| {
        eprintln!("Import failed: {}", err);
        exit(1);
    });

    let json = if config.export.pretty_json {
        doc.to_json_string_pretty()
    } else {
        doc.to_json_string()
    }
    .unwrap_or_else(|err| {
        eprintln!("Serialization failed: {}", err);
        exit(1);
    });

    match output {
        Some(output) => {
            fs::write(output, &json).unwrap_or_else(|err| {
                eprintln!("Cannot write '{}': {}", output, err);
                exit(1);
            });
            println!("Imported {} titres into {}", doc.titre_count(), output);
        }
        None => println!("{}", json),
    }
}

/// Handle the export command
fn handle_export(path: &str, output: &str, images: Option<&String>, config: &PluToolConfig) {
    let doc = load_document(path);

    let mut store = MemoryImageStore::new();
    if let Some(dir) = images {
        load_images(&mut store, &doc.id_reglement, dir);
    }

    let options = ExportOptions {
        resources_dir: config.export.resources_dir.clone(),
        pretty_json: config.export.pretty_json,
        prefix_headings: config.export.prefix_headings,
    };
    let bundle = build_export(&doc, &store, &options);
    let mut sink = sink::DirSink::new(Path::new(output));
    write_bundle(&bundle, &mut sink, &options).unwrap_or_else(|err| {
        eprintln!("Export failed: {}", err);
        exit(1);
    });
    println!(
        "Exported to {} ({} images)",
        output,
        bundle.images.len()
    );
}

fn load_images(store: &mut MemoryImageStore, scope: &str, dir: &str) {
    let entries = fs::read_dir(dir).unwrap_or_else(|err| {
        eprintln!("Cannot read image directory '{}': {}", dir, err);
        exit(1);
    });
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("skipping unreadable image '{}': {}", name, err);
                continue;
            }
        };
        if let Err(err) = store.store(scope, name, content_type_of(name), &bytes) {
            eprintln!("Cannot store image '{}': {}", name, err);
            exit(1);
        }
    }
}

fn content_type_of(name: &str) -> &'static str {
    match name.rsplit('.').next().unwrap_or_default() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Handle the split command
fn handle_split(path: &str, counts_only: bool) {
    let rich: RichDoc = serde_json::from_str(&read_file(path)).unwrap_or_else(|err| {
        eprintln!("'{}' is not a rich document: {}", path, err);
        exit(1);
    });
    let parts = split_rich_doc(&rich);
    if counts_only {
        println!("{}", parts.len());
        return;
    }
    println!("{} part(s)", parts.len());
    for (index, part) in parts.iter().enumerate() {
        println!("  part {}: {} block(s)", index + 1, part.content.len());
    }
}
