use std::io::{self, Write};

use crossterm::style::Stylize;
use serde::Serialize;

use crate::domain::CollectionType;
use crate::pipeline::{GenerationResult, ParseResult, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_generate(result: &GenerationResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_parse(result: &ParseResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct ConsoleOutput;

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!(
                "{} {}",
                event.message.as_str().cyan(),
                format!("({:.2}s)", elapsed.as_secs_f64()).dark_grey()
            ),
            None => eprintln!("{}", event.message.as_str().cyan()),
        }
    }
}

impl ConsoleOutput {
    pub fn print_generate(result: &GenerationResult) {
        println!("{}", "DME hierarchy summary".cyan().bold());
        for collection in [
            CollectionType::PiLab,
            CollectionType::Project,
            CollectionType::Sample,
            CollectionType::Analysis,
        ] {
            let count = result.count(collection);
            let line = format!("{collection:<10} {count}");
            if count == 0 {
                println!("{}", line.yellow());
            } else {
                println!("{}", line.green());
            }
        }
        println!("{} {}", "output:".dark_grey(), result.output);
        for written in &result.collections {
            println!("  {} {}", "+".green(), written.metadata_path);
        }
    }

    pub fn print_parse(result: &ParseResult) {
        println!("{}", "Parsed request sheets".cyan().bold());
        println!(
            "{}",
            format!(
                "{} dictionary fields, {} samples",
                result.dictionary_fields, result.samples
            )
            .green()
        );
        for file in &result.files {
            println!("  {} {file}", "+".green());
        }
    }
}
