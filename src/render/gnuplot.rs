use std::path::Path;

/// Clustered bar chart over a `.percentiles` table: one cluster per
/// percentile, one bar per configuration column.
pub fn bar_chart_script(
    title: &str,
    concurrency: u32,
    image: &Path,
    table: &Path,
    columns: usize,
) -> String {
    const TEMPLATE: &str = r#"
set title '__TITLE__ (c=__CONC__)'
set term png size 1800,1600
set key left top vertical samplen 4 spacing 1 font ",20"
set xtics rotate out
set out '__OUT__'
set style data histogram
set style fill solid border
set style histogram clustered gap 3
set datafile separator "\t"
plot for [COL=2:__LAST__] '__IN__' using COL:xticlabels(1) title columnheader
"#;

    fill(
        TEMPLATE,
        &[
            ("__TITLE__", escape(title).as_str()),
            ("__CONC__", concurrency.to_string().as_str()),
            ("__OUT__", escape(&image.to_string_lossy()).as_str()),
            ("__IN__", escape(&table.to_string_lossy()).as_str()),
            ("__LAST__", (columns + 1).to_string().as_str()),
        ],
    )
}

/// One series of a line chart: a cleaned artifact and its legend label.
#[derive(Debug, Clone)]
pub struct LineSeries<'a> {
    pub data: &'a Path,
    pub label: &'a str,
}

/// Smoothed latency curve per configuration: column 1 (duration) of each
/// cleaned artifact against its row number.
pub fn line_chart_script(
    title: &str,
    concurrency: u32,
    image: &Path,
    series: &[LineSeries<'_>],
) -> String {
    const TEMPLATE: &str = r#"
set title '__TITLE__ (c=__CONC__)'
set term png size 800,600
set key left
set out '__OUT__'
plot __PLOT__
"#;

    let plot = series
        .iter()
        .map(|s| {
            format!(
                "'{}' using 1 title '{}' with lines smooth csplines linewidth 4",
                escape(&s.data.to_string_lossy()),
                escape(s.label)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    fill(
        TEMPLATE,
        &[
            ("__TITLE__", escape(title).as_str()),
            ("__CONC__", concurrency.to_string().as_str()),
            ("__OUT__", escape(&image.to_string_lossy()).as_str()),
            ("__PLOT__", plot.as_str()),
        ],
    )
}

/// Substitute placeholders in one pass. Inserted values are never scanned
/// again, so a title containing `__OUT__` stays literal.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while let Some(at) = rest.find("__") {
        for &(key, value) in vars {
            if rest[at..].starts_with(key) {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + key.len()..];
                continue 'scan;
            }
        }
        out.push_str(&rest[..at + 2]);
        rest = &rest[at + 2..];
    }
    out.push_str(rest);
    out
}

/// Escape for a single-quoted gnuplot string.
fn escape(s: &str) -> String {
    s.replace('\'', "''")
}
