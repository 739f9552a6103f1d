use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use teaching_schedule::calendar::parse_iso;
use teaching_schedule::table::{equipment_dataframe, render_text_table, schedule_dataframe};
use teaching_schedule::{
    ApplyReport, ExpansionConfig, JsonFileStore, TimetableSlot, Workbook, WorkbookStore,
    export_equipment_to_csv, export_schedule_to_csv, load_curriculum_from_csv,
    load_equipment_config_from_csv, load_timetable_from_csv, load_workbook_from_json,
    save_timetable_to_csv, save_workbook_to_json,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cli", about = "Expand a weekly timetable into a teaching schedule")]
struct Args {
    /// Expansion config (JSON) applied at startup.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Workbook snapshot (JSON) loaded at startup.
    #[arg(long)]
    data: Option<PathBuf>,
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show [equipment]                   Show the selected teacher's rows for the current week\n  teacher <name...>                  Select a teacher (applies their timetable if they have no rows)\n  teachers                           List teachers found in the timetable\n  week <n>                           Go to week n\n  date <YYYY-MM-DD>                  Set the viewed date of the current week\n  slot add <day>; <period>; <subject>; <class>\n                                     Add a timetable slot for the selected teacher\n  slot list                          List the selected teacher's timetable slots\n  slot clear                         Remove the selected teacher's timetable slots\n  import <timetable|curriculum|equipment> <csv_path>\n                                     Load a CSV file\n  apply [teacher...]                 Expand the timetable for a teacher (default: selected)\n  apply-all                          Expand the timetable for every teacher\n  subjects                           List the selected teacher's subjects\n  export <schedule|equipment|timetable> <csv_path>\n                                     Write the selected teacher's rows (or the timetable) to CSV\n  config show                        Show the expansion config\n  config save <path>                 Write the expansion config as JSON\n  save <json|sqlite> <path>          Persist the workbook\n  load <json|sqlite> <path>          Load a workbook\n  quit|exit                          Exit"
    );
}

fn print_week(workbook: &Workbook, equipment: bool) {
    let teacher = workbook.teacher_name();
    if teacher.is_empty() {
        println!("No teacher selected. Use 'teacher <name>'.");
        return;
    }
    let week = workbook.current_week();
    println!(
        "Week {week} of {teacher} (view date {}, week 1 starts {})",
        workbook.view_date(),
        workbook.week1_anchor()
    );
    let frame = if equipment {
        equipment_dataframe(&workbook.week_equipment(teacher, week))
    } else {
        schedule_dataframe(&workbook.week_schedule(teacher, week))
    };
    match frame {
        Ok(df) => println!("{}", render_text_table(&df)),
        Err(e) => println!("Error building table: {}", e),
    }
}

fn print_report(report: &ApplyReport) {
    println!("Applied: {}", report.to_cli_summary());
    for diagnostic in &report.diagnostics {
        match serde_json::to_string(diagnostic) {
            Ok(json) => println!("  warning: {}", json),
            Err(e) => println!("  warning (unprintable): {}", e),
        }
    }
}

fn split_command(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}

fn parse_slot(input: &str, teacher: &str) -> Result<TimetableSlot, String> {
    let fields: Vec<&str> = input.split(';').map(str::trim).collect();
    let [day, period, subject, class] = fields.as_slice() else {
        return Err("expected '<day>; <period>; <subject>; <class>'".to_string());
    };
    let period = period
        .parse::<u32>()
        .map_err(|_| format!("invalid period '{period}'"))?;
    if subject.is_empty() {
        return Err("subject must not be empty".to_string());
    }
    let slot = TimetableSlot::new(*day, period, *subject, *class);
    Ok(if teacher.is_empty() {
        slot
    } else {
        slot.with_teacher(teacher)
    })
}

#[cfg(feature = "sqlite")]
fn save_sqlite(workbook: &Workbook, path: &str) -> Result<(), String> {
    let store = teaching_schedule::SqliteWorkbookStore::new(path).map_err(|e| e.to_string())?;
    store.save_workbook(workbook).map_err(|e| e.to_string())
}

#[cfg(feature = "sqlite")]
fn load_sqlite(path: &str) -> Result<Option<Workbook>, String> {
    let store = teaching_schedule::SqliteWorkbookStore::new(path).map_err(|e| e.to_string())?;
    store.load_workbook().map_err(|e| e.to_string())
}

#[cfg(not(feature = "sqlite"))]
fn save_sqlite(_workbook: &Workbook, _path: &str) -> Result<(), String> {
    Err("rebuild with the `sqlite` feature to use SQLite storage".to_string())
}

#[cfg(not(feature = "sqlite"))]
fn load_sqlite(_path: &str) -> Result<Option<Workbook>, String> {
    Err("rebuild with the `sqlite` feature to use SQLite storage".to_string())
}

fn initial_workbook(args: &Args) -> Result<Workbook, String> {
    let mut workbook = match &args.data {
        Some(path) => match JsonFileStore::new(path).load_workbook() {
            Ok(Some(workbook)) => workbook,
            Ok(None) => Workbook::default(),
            Err(e) => return Err(format!("Error loading {}: {}", path.display(), e)),
        },
        None => Workbook::default(),
    };
    if let Some(path) = &args.config {
        let config = ExpansionConfig::load_json(path)
            .map_err(|e| format!("Error loading {}: {}", path.display(), e))?;
        workbook.set_config(config).map_err(|e| e.to_string())?;
    }
    Ok(workbook)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut workbook = match initial_workbook(&args) {
        Ok(workbook) => workbook,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    };

    println!("Teaching Schedule (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let (cmd, rest) = split_command(input);
        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print_week(&workbook, rest == "equipment"),
            "teacher" => {
                if rest.is_empty() {
                    println!("Usage: teacher <name...>");
                    continue;
                }
                let report = workbook.select_teacher(rest);
                println!("Selected teacher {}.", rest);
                if report.is_applied() {
                    print_report(&report);
                }
                print_week(&workbook, false);
            }
            "teachers" => {
                let teachers = workbook.teachers();
                if teachers.is_empty() {
                    println!("No teachers in the timetable.");
                }
                for teacher in teachers {
                    println!("  {}", teacher);
                }
            }
            "week" => match rest.parse::<u32>() {
                Ok(week) => match workbook.change_week(week) {
                    Ok(()) => print_week(&workbook, false),
                    Err(e) => println!("Error: {}", e),
                },
                Err(_) => println!("Usage: week <n>"),
            },
            "date" => match parse_iso(rest) {
                Some(date) => match workbook.set_view_date(date) {
                    Ok(()) => println!(
                        "Viewed date set to {}; week 1 starts {}.",
                        date,
                        workbook.week1_anchor()
                    ),
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: date <YYYY-MM-DD>"),
            },
            "slot" => {
                let (sub, args) = split_command(rest);
                let teacher = workbook.teacher_name().to_string();
                match sub {
                    "add" => match parse_slot(args, &teacher) {
                        Ok(slot) => {
                            println!(
                                "Added slot {} period {} {} {}.",
                                slot.day_of_week, slot.period, slot.subject, slot.class_name
                            );
                            workbook.add_slot(slot);
                        }
                        Err(e) => {
                            println!("Error: {}", e);
                            println!("Usage: slot add <day>; <period>; <subject>; <class>");
                        }
                    },
                    "list" => {
                        let slots = if teacher.is_empty() {
                            workbook.timetable().to_vec()
                        } else {
                            workbook.slots_for_teacher(&teacher)
                        };
                        if slots.is_empty() {
                            println!("No slots.");
                        }
                        for slot in slots {
                            println!(
                                "  {:<12} {:>2}  {:<20} {:<8} {}",
                                slot.day_of_week,
                                slot.period,
                                slot.subject,
                                slot.class_name,
                                slot.teacher_name.as_deref().unwrap_or("")
                            );
                        }
                    }
                    "clear" => {
                        if teacher.is_empty() {
                            println!("No teacher selected. Use 'teacher <name>'.");
                            continue;
                        }
                        let before = workbook.timetable().len();
                        let kept: Vec<TimetableSlot> = workbook
                            .timetable()
                            .iter()
                            .filter(|slot| !slot.taught_by(&teacher))
                            .cloned()
                            .collect();
                        let removed = before - kept.len();
                        workbook.set_timetable(kept);
                        println!("Removed {} slot(s).", removed);
                    }
                    _ => println!("Usage: slot add|list|clear"),
                }
            }
            "import" => {
                let (kind, path) = split_command(rest);
                match (kind, path) {
                    ("timetable", path) if !path.is_empty() => match load_timetable_from_csv(path) {
                        Ok(slots) => {
                            println!("Imported {} timetable slot(s).", slots.len());
                            workbook.set_timetable(slots);
                        }
                        Err(e) => println!("Error importing {}: {}", path, e),
                    },
                    ("curriculum", path) if !path.is_empty() => {
                        match load_curriculum_from_csv(path) {
                            Ok(entries) => {
                                println!("Imported {} curriculum entr(ies).", entries.len());
                                workbook.set_curriculum(entries);
                            }
                            Err(e) => println!("Error importing {}: {}", path, e),
                        }
                    }
                    ("equipment", path) if !path.is_empty() => {
                        match load_equipment_config_from_csv(path) {
                            Ok(entries) => {
                                println!("Imported {} equipment entr(ies).", entries.len());
                                workbook.set_equipment_config(entries);
                            }
                            Err(e) => println!("Error importing {}: {}", path, e),
                        }
                    }
                    _ => println!("Usage: import <timetable|curriculum|equipment> <csv_path>"),
                }
            }
            "apply" => {
                let teacher = if rest.is_empty() {
                    workbook.teacher_name().to_string()
                } else {
                    rest.to_string()
                };
                if teacher.is_empty() {
                    println!("Usage: apply [teacher...] (no teacher selected)");
                    continue;
                }
                let slots = workbook.slots_for_teacher(&teacher);
                if slots.is_empty() {
                    println!("No timetable slots for {}.", teacher);
                    continue;
                }
                let report = workbook.apply_template(&slots, Some(&teacher));
                print_report(&report);
                print_week(&workbook, false);
            }
            "apply-all" => {
                let report = workbook.apply_all_teachers();
                print_report(&report);
            }
            "subjects" => {
                let subjects = workbook.teacher_subjects(workbook.teacher_name());
                if subjects.is_empty() {
                    println!("No subjects.");
                }
                for subject in subjects {
                    println!("  {}", subject);
                }
            }
            "export" => {
                let (kind, path) = split_command(rest);
                let teacher = workbook.teacher_name().to_string();
                let result = match (kind, path) {
                    (_, "") => {
                        println!("Usage: export <schedule|equipment|timetable> <csv_path>");
                        continue;
                    }
                    ("schedule", path) => {
                        let rows: Vec<_> = workbook
                            .schedule()
                            .iter()
                            .filter(|row| teacher.is_empty() || row.teacher_name == teacher)
                            .cloned()
                            .collect();
                        export_schedule_to_csv(&rows, path).map(|_| rows.len())
                    }
                    ("equipment", path) => {
                        let rows: Vec<_> = workbook
                            .equipment()
                            .iter()
                            .filter(|row| teacher.is_empty() || row.teacher_name == teacher)
                            .cloned()
                            .collect();
                        export_equipment_to_csv(&rows, path).map(|_| rows.len())
                    }
                    ("timetable", path) => save_timetable_to_csv(workbook.timetable(), path)
                        .map(|_| workbook.timetable().len()),
                    _ => {
                        println!("Usage: export <schedule|equipment|timetable> <csv_path>");
                        continue;
                    }
                };
                match result {
                    Ok(count) => println!("Exported {} row(s) to {}.", count, path),
                    Err(e) => println!("Error exporting {}: {}", path, e),
                }
            }
            "config" => match split_command(rest) {
                ("show", "") => match serde_json::to_string_pretty(workbook.config()) {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("Error serializing config: {}", e),
                },
                ("save", path) if !path.is_empty() => match workbook.config().save_json(path) {
                    Ok(()) => println!("Config saved to {}.", path),
                    Err(e) => println!("Error saving config: {}", e),
                },
                _ => println!("Usage: config show|save <path>"),
            },
            "save" => {
                let (fmt, path) = split_command(rest);
                let result = match (fmt, path) {
                    ("json", path) if !path.is_empty() => {
                        save_workbook_to_json(&workbook, path).map_err(|e| e.to_string())
                    }
                    ("sqlite", path) if !path.is_empty() => save_sqlite(&workbook, path),
                    _ => {
                        println!("Usage: save <json|sqlite> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(()) => println!("Workbook saved to {}.", path),
                    Err(e) => println!("Error saving workbook: {}", e),
                }
            }
            "load" => {
                let (fmt, path) = split_command(rest);
                let result = match (fmt, path) {
                    ("json", path) if !path.is_empty() => {
                        load_workbook_from_json(path).map(Some).map_err(|e| e.to_string())
                    }
                    ("sqlite", path) if !path.is_empty() => load_sqlite(path),
                    _ => {
                        println!("Usage: load <json|sqlite> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(Some(loaded)) => {
                        workbook = loaded;
                        println!("Workbook loaded from {}.", path);
                        print_week(&workbook, false);
                    }
                    Ok(None) => println!("No workbook stored in {}.", path),
                    Err(e) => println!("Error loading workbook: {}", e),
                }
            }
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
