use carefile::api::{ImportReport, Table};
use carefile::codec::{parse_timestamp, render_timestamp};
use carefile::error::Result;
use carefile::init::{initialize, resolve_data_dir, CarefileContext};
use carefile::logging::{default_log_level, init_logging, logging_status};
use carefile::model::{Collection, Label};
use carefile::repo::MalformedRow;
use carefile::views::{AppointmentDetail, MedicineDetail};
use chrono::{NaiveDateTime, Utc};
use clap::Parser;
use colored::*;
use log::info;
use std::path::PathBuf;
use unicode_width::UnicodeWidthStr;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir.clone())?;

    let level = if cli.verbose {
        "debug"
    } else {
        default_log_level()
    };
    if let Err(e) = init_logging(level, &data_dir.join("logs"), cli.verbose) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let ctx = initialize(&data_dir)?;
    info!(
        "event=command module=cli status=start command={:?}",
        cli.command
    );

    match cli.command {
        Commands::Init => handle_init(&ctx),
        Commands::Columns { collection } => handle_columns(&ctx, collection),
        Commands::List { collection } => handle_list(&ctx, collection),
        Commands::Show {
            collection,
            id,
            json,
        } => handle_show(&ctx, collection, &id, json),
        Commands::Find {
            collection,
            column,
            value,
        } => handle_find(&ctx, collection, &column, &value),
        Commands::Delete { collection, id } => handle_delete(&ctx, collection, &id),
        Commands::Import { collection, file } => handle_import(&ctx, collection, file),
        Commands::Appointments { doctor, patient } => handle_appointments(&ctx, doctor, patient),
        Commands::Medicines => handle_medicines(&ctx),
    }
}

fn handle_init(ctx: &CarefileContext) -> Result<()> {
    println!("{} {}", "Data directory:".dimmed(), ctx.data_dir.display());
    match logging_status() {
        Some((level, log_dir)) => {
            println!("{} {} ({})", "Logs:".dimmed(), log_dir.display(), level)
        }
        None => println!("{} disabled", "Logs:".dimmed()),
    }
    let rows: Vec<Vec<String>> = ctx
        .api
        .summary()?
        .into_iter()
        .map(|(collection, count)| {
            vec![
                collection.to_string(),
                count.to_string(),
                collection.file_name(ctx.config.file_ext()),
            ]
        })
        .collect();
    print_table(&["collection", "rows", "file"], &rows);
    Ok(())
}

fn handle_columns(ctx: &CarefileContext, collection: Collection) -> Result<()> {
    for (i, column) in ctx.api.columns(collection).iter().enumerate() {
        println!("{:>2}. {}", i + 1, column);
    }
    Ok(())
}

fn handle_list(ctx: &CarefileContext, collection: Collection) -> Result<()> {
    let table = ctx.api.list(collection)?;
    print_collection(collection, &table);
    print_malformed(&table.malformed);
    Ok(())
}

fn handle_show(ctx: &CarefileContext, collection: Collection, id: &str, json: bool) -> Result<()> {
    if json {
        let value = ctx.api.show(collection, id)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let fields = ctx.api.show_fields(collection, id)?;
    let width = fields.iter().map(|(c, _)| c.width()).max().unwrap_or(0);
    for (column, value) in &fields {
        let pad = width.saturating_sub(column.width());
        println!("{}{}  {}", column.bold(), " ".repeat(pad), value);
    }
    if let Some(updated) = fields.last().and_then(|(_, v)| parse_timestamp(v)) {
        println!("{}", format!("updated {}", format_time_ago(updated)).dimmed());
    }
    Ok(())
}

fn handle_find(
    ctx: &CarefileContext,
    collection: Collection,
    column: &str,
    value: &str,
) -> Result<()> {
    let table = ctx.api.find(collection, column, value)?;
    print_collection(collection, &table);
    Ok(())
}

fn handle_delete(ctx: &CarefileContext, collection: Collection, id: &str) -> Result<()> {
    ctx.api.delete(collection, id)?;
    println!("{}", format!("Deleted {} `{}`", collection, id).green());
    Ok(())
}

fn handle_import(ctx: &CarefileContext, collection: Collection, file: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&file)?;
    let ImportReport { imported, rejected } = ctx.api.import(collection, &text)?;
    println!(
        "{}",
        format!("Imported {} row(s) into {}", imported, collection).green()
    );
    for row in &rejected {
        println!(
            "{}",
            format!(
                "Rejected line {} (`{}`): {}",
                row.line, row.key, row.error
            )
            .yellow()
        );
    }
    Ok(())
}

fn handle_appointments(
    ctx: &CarefileContext,
    doctor: Option<String>,
    patient: Option<String>,
) -> Result<()> {
    let details = match (doctor, patient) {
        (Some(doctor_id), _) => ctx.api.appointments_for_doctor(&doctor_id)?,
        (None, Some(patient_id)) => ctx.api.appointments_for_patient(&patient_id)?,
        (None, None) => ctx.api.appointment_details()?,
    };
    if details.is_empty() {
        println!("No appointments found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = details.iter().map(appointment_row).collect();
    print_table(
        &["id", "starts", "ends", "doctor", "patient", "status", "reason"],
        &rows,
    );
    Ok(())
}

fn appointment_row(detail: &AppointmentDetail) -> Vec<String> {
    let a = &detail.appointment;
    vec![
        a.record.id.clone(),
        render_timestamp(&a.starts_at),
        render_timestamp(&a.ends_at),
        detail.doctor.name.clone(),
        detail.patient.name.clone(),
        a.status.label().to_string(),
        a.reason.clone(),
    ]
}

fn handle_medicines(ctx: &CarefileContext) -> Result<()> {
    let details = ctx.api.medicine_details()?;
    if details.is_empty() {
        println!("No medicines found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = details.iter().map(medicine_row).collect();
    print_table(&["id", "name", "stock", "alert at", "pending request"], &rows);
    Ok(())
}

fn medicine_row(detail: &MedicineDetail) -> Vec<String> {
    let m = &detail.medicine;
    let pending = match &detail.pending_request {
        Some(p) => {
            let by = p
                .pharmacist
                .as_ref()
                .map(|ph| ph.name.as_str())
                .unwrap_or("unknown pharmacist");
            format!("{} units by {}", p.request.quantity, by)
        }
        None => "-".to_string(),
    };
    vec![
        m.record.id.clone(),
        m.name.clone(),
        m.stock.to_string(),
        m.low_stock_alert.to_string(),
        pending,
    ]
}

fn print_collection(collection: Collection, table: &Table) {
    if table.rows.is_empty() {
        println!("No {} found.", collection);
        return;
    }
    let header: Vec<&str> = table.header.iter().map(String::as_str).collect();
    print_table(&header, &table.rows);
}

fn print_malformed(malformed: &[MalformedRow]) {
    for row in malformed {
        println!(
            "{}",
            format!(
                "Skipped row {} (`{}`): {}",
                row.line, row.key, row.error
            )
            .yellow()
        );
    }
}

const MAX_CELL_WIDTH: usize = 32;

fn print_table(header: &[&str], rows: &[Vec<String>]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| truncate_to_width(c, MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }

    let header_line: Vec<String> = header
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad_to_width(h, *w))
        .collect();
    println!("{}", header_line.join("  ").bold().cyan());

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad_to_width(c, *w))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

fn pad_to_width(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.width())))
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: NaiveDateTime) -> String {
    let duration = Utc::now().naive_utc().signed_duration_since(timestamp);
    timeago::Formatter::new().convert(duration.to_std().unwrap_or_default())
}
