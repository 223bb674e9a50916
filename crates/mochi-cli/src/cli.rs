//! Command line surface

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mochi_model::Visibility;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mochilist", version, about = "Travel plans and packing checklists")]
pub struct Cli {
    /// Configuration file (defaults to ./mochilist.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Draft file, overriding the configured one
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Confirm changes with the configured authority
    #[arg(long, global = true)]
    pub remote: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List plans, newest first
    Plans,

    /// Create a plan with the default checklist
    Create {
        destination: String,
        /// First day of the trip (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        #[arg(long, default_value_t = 1)]
        days: u32,
        #[arg(long)]
        departure: Option<String>,
        #[arg(long, default_value_t = 0)]
        companions: u32,
        /// Trip purpose, repeatable
        #[arg(long = "purpose")]
        purposes: Vec<String>,
    },

    /// Show a plan with its checklist
    Show {
        plan: String,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Flip an item's checked flag
    Toggle { item: String },

    /// Move an item next to another item of the same category
    Move { dragged: String, target: String },

    /// Append an item to a category
    AddItem {
        category: String,
        name: String,
        #[arg(long, default_value = "")]
        quantity: String,
        /// Put the item in the extra column
        #[arg(long)]
        optional: bool,
    },

    /// Append a category to a plan
    AddCategory {
        plan: String,
        #[arg(default_value = "")]
        title: String,
    },

    /// Set an item's quantity
    SetQty { item: String, quantity: String },

    DeleteItem { item: String },

    DeletePlan { plan: String },

    /// Send the whole checklist; promotes a guest plan
    Save { plan: String },

    /// Issue a share link
    Share { plan: String },

    /// Publish the plan as a template
    Publish {
        plan: String,
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// private or public
        #[arg(long, default_value = "private")]
        visibility: Visibility,
    },
}
