// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crossfield::*;

fn read_data(file: &str) -> Result<Value> {
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))?;
    Ok(if file.ends_with(".json") {
        serde_json::from_str(&contents)?
    } else if file.ends_with(".yaml") {
        serde_yaml::from_str(&contents)?
    } else {
        bail!("Unsupported data file `{file}`. Must be json or yaml.")
    })
}

fn data_context(data: Option<String>, previous: Option<String>) -> Result<DataContext> {
    let current = match data {
        Some(file) => read_data(&file)?,
        None => Value::new_object(),
    };
    Ok(match previous {
        Some(file) => DataContext::with_previous(current, read_data(&file)?),
        None => DataContext::new(current),
    })
}

fn make_engine(options: Option<String>) -> Result<Engine> {
    match options {
        Some(file) => Engine::with_options(EngineOptions::from_json_file(&file)?),
        None => Ok(Engine::new()),
    }
}

fn crossfield_lex(expr: String) -> Result<()> {
    let tokens = tokenize(&expr).map_err(|e| {
        let e = SyntaxError::from(e);
        anyhow::anyhow!(e.render(&expr, "<expr>"))
    })?;
    for token in tokens {
        println!("{token:?}");
    }
    Ok(())
}

fn crossfield_validate(expr: String, options: Option<String>) -> Result<()> {
    let engine = make_engine(options)?;
    let result = engine.validate(&expr);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn crossfield_eval(
    expr: String,
    data: Option<String>,
    previous: Option<String>,
    options: Option<String>,
) -> Result<()> {
    let engine = make_engine(options)?;
    let ctx = data_context(data, previous)?;
    match engine.evaluate(&expr, &ctx) {
        Ok(r) => println!("{r}"),
        Err(e) => bail!(e.render(&expr, "<expr>")),
    }
    Ok(())
}

fn crossfield_type_check(constraints: String, schemas: String) -> Result<()> {
    let file = ConstraintFile::from_json_file(&constraints)?;
    let registry = SchemaRegistry::from_json_file(&schemas)?;
    let result = type_check(&file, &registry);
    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.valid {
        bail!("{} type error(s) in {constraints}", result.errors.len());
    }
    Ok(())
}

fn crossfield_check(
    constraints: String,
    data: Option<String>,
    previous: Option<String>,
    options: Option<String>,
) -> Result<()> {
    let mut engine = make_engine(options)?;
    engine.set_constraint_file_from_json_file(&constraints)?;
    let ctx = data_context(data, previous)?;
    let report = engine.check_record(&ctx)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.passed {
        bail!("record violates {} constraint(s)", report.violations.len());
    }
    Ok(())
}

#[derive(Subcommand)]
enum CrossfieldCommand {
    /// Tokenize an expression.
    Lex {
        /// Expression text.
        expr: String,
    },

    /// Check the syntax of an expression without evaluating it.
    Validate {
        /// Expression text.
        expr: String,

        /// Engine options. json.
        #[arg(long, short, value_name = "options.json")]
        options: Option<String>,
    },

    /// Evaluate an expression against a record.
    Eval {
        /// Expression text.
        expr: String,

        /// Current record. json or yaml.
        #[arg(long, short, value_name = "record.json|record.yaml")]
        data: Option<String>,

        /// Previous version of the record. json or yaml.
        #[arg(long, short, value_name = "previous.json")]
        previous: Option<String>,

        /// Engine options. json.
        #[arg(long, short, value_name = "options.json")]
        options: Option<String>,
    },

    /// Type-check a constraint file against a schema registry.
    TypeCheck {
        /// Constraint file. json.
        constraints: String,

        /// Schema registry. json.
        #[arg(long, short, value_name = "schemas.json")]
        schemas: String,
    },

    /// Check a record against every constraint in a file.
    Check {
        /// Constraint file. json.
        constraints: String,

        /// Current record. json or yaml.
        #[arg(long, short, value_name = "record.json|record.yaml")]
        data: Option<String>,

        /// Previous version of the record. json or yaml.
        #[arg(long, short, value_name = "previous.json")]
        previous: Option<String>,

        /// Engine options. json.
        #[arg(long, short, value_name = "options.json")]
        options: Option<String>,
    },
}

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CrossfieldCommand,
}

fn main() -> Result<()> {
    env_logger::init();

    // Parse and dispatch command.
    let cli = Cli::parse();
    match cli.command {
        CrossfieldCommand::Lex { expr } => crossfield_lex(expr),
        CrossfieldCommand::Validate { expr, options } => crossfield_validate(expr, options),
        CrossfieldCommand::Eval {
            expr,
            data,
            previous,
            options,
        } => crossfield_eval(expr, data, previous, options),
        CrossfieldCommand::TypeCheck {
            constraints,
            schemas,
        } => crossfield_type_check(constraints, schemas),
        CrossfieldCommand::Check {
            constraints,
            data,
            previous,
            options,
        } => crossfield_check(constraints, data, previous, options),
    }
}
