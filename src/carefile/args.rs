use carefile::model::Collection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "carefile")]
#[command(about = "Inspect and maintain hospital record files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (defaults to $CAREFILE_HOME, then the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create any missing collection files and print row counts
    Init,

    /// Print the column layout of a collection
    Columns {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },

    /// List every row of a collection
    #[command(alias = "ls")]
    List {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
    },

    /// Show one entity by id
    Show {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List rows whose column equals a value
    Find {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        column: String,
        value: String,
    },

    /// Delete one entity by id
    #[command(alias = "rm")]
    Delete {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        id: String,
    },

    /// Append rows from a CSV export (header line optional)
    Import {
        #[arg(value_parser = parse_collection)]
        collection: Collection,
        file: PathBuf,
    },

    /// Appointments with their doctor and patient
    Appointments {
        /// Only this doctor's appointments
        #[arg(long, conflicts_with = "patient")]
        doctor: Option<String>,

        /// Only this patient's appointments
        #[arg(long)]
        patient: Option<String>,
    },

    /// Medicines with their pending replenishment request
    Medicines,
}

fn parse_collection(s: &str) -> Result<Collection, String> {
    s.parse()
}
