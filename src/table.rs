use crate::timetable::{EquipmentRow, ScheduleRow};
use chrono::NaiveDate;
use polars::prelude::*;

/// Column view of schedule rows, in the order given (ids are left out).
pub fn schedule_dataframe(rows: &[ScheduleRow]) -> PolarsResult<DataFrame> {
    let columns = vec![
        u32_column("week", rows.iter().map(|r| r.week)),
        str_column("day_of_week", rows.iter().map(|r| r.day_of_week.as_str())),
        date_column("date", rows.iter().map(|r| r.date))?,
        u32_column("period", rows.iter().map(|r| r.period)),
        str_column("subject", rows.iter().map(|r| r.subject.as_str())),
        str_column("class_name", rows.iter().map(|r| r.class_name.as_str())),
        str_column("ppct_number", rows.iter().map(|r| r.ppct_number.as_str())),
        str_column("lesson_name", rows.iter().map(|r| r.lesson_name.as_str())),
        str_column("notes", rows.iter().map(|r| r.notes.as_str())),
    ];
    DataFrame::new(columns)
}

pub fn equipment_dataframe(rows: &[EquipmentRow]) -> PolarsResult<DataFrame> {
    let columns = vec![
        u32_column("week", rows.iter().map(|r| r.week)),
        str_column("day_of_week", rows.iter().map(|r| r.day_of_week.as_str())),
        date_column("date", rows.iter().map(|r| r.date))?,
        u32_column("period", rows.iter().map(|r| r.period)),
        str_column("subject", rows.iter().map(|r| r.subject.as_str())),
        str_column("class_name", rows.iter().map(|r| r.class_name.as_str())),
        str_column("ppct_number", rows.iter().map(|r| r.ppct_number.as_str())),
        str_column("equipment_name", rows.iter().map(|r| r.equipment_name.as_str())),
        str_column("quantity", rows.iter().map(|r| r.quantity.as_str())),
    ];
    DataFrame::new(columns)
}

fn u32_column(name: &'static str, values: impl Iterator<Item = u32>) -> Column {
    let data: Vec<u32> = values.collect();
    Series::new(PlSmallStr::from_static(name), data).into_column()
}

fn str_column<'a>(name: &'static str, values: impl Iterator<Item = &'a str>) -> Column {
    let data: Vec<&str> = values.collect();
    Series::new(PlSmallStr::from_static(name), data).into_column()
}

fn date_column(name: &'static str, values: impl Iterator<Item = NaiveDate>) -> PolarsResult<Column> {
    let data: Vec<i32> = values.map(date_to_i32).collect();
    Ok(Series::new(PlSmallStr::from_static(name), data)
        .cast(&DataType::Date)?
        .into_column())
}

fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

/// Plain-text grid of a frame, one line per row.
pub fn render_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| match col.get(row_idx) {
                    Ok(AnyValue::Null) | Err(_) => String::new(),
                    Ok(AnyValue::String(s)) => s.to_string(),
                    Ok(other) => other.to_string(),
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_line(&mut out, &names, &widths);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(width.saturating_sub(cell.chars().count())));
        out.push_str(" |");
    }
    out.push('\n');
}
