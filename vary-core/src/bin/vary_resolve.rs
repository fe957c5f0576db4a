//! Vary Resolve CLI - resolve a subject against an ad hoc context
//!
//! Usage:
//!     vary-resolve card --attr width=300
//!     vary-resolve --manifest subjects.json card --attr width=300 --attr purpose=editing
//!     vary-resolve --json panel --attr permissions=read,write
//!
//! Attribute values parse as flag (`true`/`false`), number, comma-separated
//! set, or plain text, in that order. A trailing comma forces a one-element
//! set: `--attr permissions=read,` yields the set `{read}`, while
//! `--attr permissions=read` is plain text.

use clap::Parser;
use std::path::PathBuf;

use vary_core::{AttrValue, Context, Resolver, Selection};

#[derive(Parser, Debug)]
#[command(name = "vary-resolve")]
#[command(about = "Resolve a subject's variant for a context")]
#[command(version)]
struct Args {
    /// Subject id to resolve
    subject: String,

    /// Path to subjects manifest JSON (default: looks for subjects.json)
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Context attribute as key=value; repeatable
    #[arg(short, long = "attr")]
    attrs: Vec<String>,

    /// Output as JSON instead of rendered text
    #[arg(long)]
    json: bool,

    /// Verbose output (show scoring diagnostics)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let manifest = match load_manifest(&args.manifest) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error loading manifest: {}", e);
            std::process::exit(1);
        }
    };

    let resolver = Resolver::new();
    if let Err(e) = resolver.load_manifest(&manifest) {
        eprintln!("Error registering subjects: {}", e);
        std::process::exit(1);
    }

    let ctx = match build_context(&args.attrs) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error parsing context attributes: {}", e);
            std::process::exit(1);
        }
    };

    if args.verbose {
        eprintln!("Subjects: {:?}", resolver.registry().subject_ids());
        eprintln!("Context: {} attribute(s)", ctx.len());
        for (name, value) in ctx.iter() {
            eprintln!("  {} = {:?}", name, value);
        }
        eprintln!();
    }

    let selection = match resolver.resolve(&args.subject, &ctx) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error resolving '{}': {}", args.subject, e);
            std::process::exit(1);
        }
    };

    if args.json {
        output_json(&selection);
    } else {
        output_rendered(&args.subject, &selection, args.verbose);
    }
}

fn load_manifest(path: &Option<PathBuf>) -> Result<String, String> {
    if let Some(p) = path {
        return std::fs::read_to_string(p)
            .map_err(|e| format!("failed to read {}: {}", p.display(), e));
    }

    let default_paths = [
        PathBuf::from("subjects.json"),
        PathBuf::from("manifests/subjects.json"),
        PathBuf::from("../subjects.json"),
    ];

    for p in &default_paths {
        if p.exists() {
            return std::fs::read_to_string(p)
                .map_err(|e| format!("failed to read {}: {}", p.display(), e));
        }
    }

    Err("No manifest found. Specify with --manifest or place subjects.json in the working directory.".to_string())
}

fn build_context(attrs: &[String]) -> Result<Context, String> {
    let mut builder = Context::builder();

    for pair in attrs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("'{}' is not key=value", pair))?;
        builder = builder.attr(key, parse_value(raw));
    }

    Ok(builder.build())
}

fn parse_value(raw: &str) -> AttrValue {
    if raw.eq_ignore_ascii_case("true") {
        return AttrValue::Flag(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return AttrValue::Flag(false);
    }
    if let Ok(n) = raw.parse::<f64>() {
        return AttrValue::Number(n);
    }
    if raw.contains(',') {
        // Empty segments drop out, so "read," is the one-element set {read}
        return AttrValue::Set(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        );
    }
    AttrValue::Text(raw.to_string())
}

fn output_json(selection: &Selection) {
    match serde_json::to_string_pretty(selection) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing selection: {}", e);
            std::process::exit(1);
        }
    }
}

fn output_rendered(subject: &str, selection: &Selection, verbose: bool) {
    println!("{} -> {}", subject, selection.variant_name);

    if selection.fell_through() {
        println!("  (no trigger matched; default variant)");
    } else if verbose {
        println!("  score: {}", selection.score);
        if let Some(trigger) = &selection.matched_trigger {
            for (field, constraint) in trigger.constraints() {
                println!("  matched {}: {:?}", field, constraint);
            }
        }
    }

    if verbose {
        println!("  from_cache: {}", selection.from_cache);
    }

    println!("  payload: {}", selection.payload);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_types() {
        assert_eq!(parse_value("true"), AttrValue::Flag(true));
        assert_eq!(parse_value("300"), AttrValue::Number(300.0));
        assert_eq!(parse_value("editing"), AttrValue::Text("editing".to_string()));
        assert_eq!(
            parse_value("read,write"),
            AttrValue::Set(vec!["read".to_string(), "write".to_string()])
        );
    }

    #[test]
    fn test_trailing_comma_forces_one_element_set() {
        assert_eq!(
            parse_value("read,"),
            AttrValue::Set(vec!["read".to_string()])
        );
    }

    #[test]
    fn test_build_context_parses_mixed_attrs() {
        assert!(build_context(&["width".to_string()]).is_err());

        let ctx = build_context(&["width=300".to_string(), "permissions=read,".to_string()])
            .unwrap();
        assert_eq!(ctx.number("width"), Some(300.0));
        assert_eq!(ctx.set("permissions").map(|s| s.len()), Some(1));
    }
}
