use std::collections::BTreeSet;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    /// Print only the `id` of each record.
    Quiet,
}

pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn render<T: Serialize>(&self, value: &T) -> Result<()> {
        let rendered = self.render_to_string(value)?;
        if !rendered.is_empty() {
            println!("{rendered}");
        }
        Ok(())
    }

    pub fn render_to_string<T: Serialize>(&self, value: &T) -> Result<String> {
        let json_value = serde_json::to_value(value)?;

        let rendered = match self.format {
            OutputFormat::Table => match Self::render_table(&json_value) {
                Some(table) => table,
                None => serde_json::to_string_pretty(&json_value)?,
            },
            OutputFormat::Json => serde_json::to_string_pretty(&json_value)?,
            OutputFormat::Yaml => serde_yaml::to_string(&json_value)?
                .trim_end()
                .to_string(),
            OutputFormat::Quiet => Self::render_quiet(&json_value).join("\n"),
        };

        Ok(rendered)
    }

    fn render_table(value: &Value) -> Option<String> {
        let (headers, rows) = match value {
            Value::Object(_) => Self::coerce_rows(&Value::Array(vec![value.clone()]))?,
            other => Self::coerce_rows(other)?,
        };

        let mut builder = Builder::default();
        builder.push_record(headers);
        for row in rows {
            builder.push_record(row);
        }

        Some(builder.build().with(Style::rounded()).to_string())
    }

    fn render_quiet(value: &Value) -> Vec<String> {
        let id_of = |row: &Value| row.get("id").filter(|id| !id.is_null()).map(Self::value_to_string);

        match value {
            Value::Array(rows) => rows.iter().filter_map(id_of).collect(),
            Value::Object(_) => id_of(value).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    fn coerce_rows(value: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
        let rows = match value {
            Value::Array(rows) if !rows.is_empty() => rows,
            _ => return None,
        };

        let mut headers = BTreeSet::new();
        for row in rows {
            if let Value::Object(obj) = row {
                headers.extend(obj.keys().cloned());
            }
        }

        if headers.is_empty() {
            return None;
        }

        // `id` first, the rest alphabetical.
        let mut headers_vec: Vec<String> = headers.into_iter().collect();
        if let Some(pos) = headers_vec.iter().position(|h| h == "id") {
            let id = headers_vec.remove(pos);
            headers_vec.insert(0, id);
        }

        let data = rows
            .iter()
            .map(|row| {
                headers_vec
                    .iter()
                    .map(|header| row.get(header).map(Self::value_to_string).unwrap_or_default())
                    .collect()
            })
            .collect();

        Some((headers_vec, data))
    }

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}
