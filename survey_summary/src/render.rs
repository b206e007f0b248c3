pub use crate::config::*;

use crate::goals::GoalIndex;
use crate::latex::{
    escape_tex, escape_tex_inline, fill_template, DocumentSettings, LatexWriter, TemplateVars,
};

use log::debug;

/// One line of a section: a label and the value of a column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ItemSpec {
    pub label: String,
    pub column: ColumnPattern,
    /// Appended verbatim after the value (LaTeX).
    pub suffix: String,
    /// Leave the item out when the value is missing, instead of printing N/A.
    pub skip_if_missing: bool,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SectionLayout {
    pub title: String,
    pub items: Vec<ItemSpec>,
}

/// Which objectives of a record are reported.
///
/// Objective 1 is always considered. Objective `n > 1` is considered when the
/// presence column of `n` holds `presence_value`, or always if there is no
/// presence column configured.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ObjectiveGate {
    pub count: u32,
    pub presence_column: Option<ColumnPattern>,
    pub presence_value: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CommitteeLayout {
    pub document: DocumentSettings,
    /// Rendered once, from the first record of the committee.
    pub info_section: SectionLayout,
    pub summary_title: String,
    pub sections_before_objectives: Vec<SectionLayout>,
    pub objectives_title: String,
    /// The first field is the description: an objective without one is skipped.
    pub objective_fields: Vec<ItemSpec>,
    pub sections_after_objectives: Vec<SectionLayout>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OverallLayout {
    pub document: DocumentSettings,
    pub summary_title: String,
    /// Template added at the end of the document.
    pub footer: Option<String>,
}

const NOT_AVAILABLE: &str = "N/A";

/// Renders the report of one committee.
///
/// When the committee has several records, the per-record sections are
/// repeated with a `(Submission k)` suffix.
pub fn render_committee(
    dataset: &Dataset,
    group: &Group,
    summary: &Summary,
    layout: &CommitteeLayout,
    gate: &ObjectiveGate,
    vars: &TemplateVars,
) -> Result<String, RenderError> {
    debug!(
        "render_committee: {:?}: {} records",
        group.key,
        group.records.len()
    );
    let mut w = LatexWriter::begin(&layout.document, vars)?;
    if let Some(first) = group.records.first() {
        write_section(&mut w, dataset, first, &layout.info_section, "");
    }
    write_summary(&mut w, &layout.summary_title, summary, None);

    let multiple = group.records.len() > 1;
    for (k, record) in group.records.iter().enumerate() {
        let suffix = if multiple {
            format!(" (Submission {})", k + 1)
        } else {
            String::new()
        };
        for section in layout.sections_before_objectives.iter() {
            write_section(&mut w, dataset, record, section, &suffix);
        }
        write_objectives(&mut w, dataset, record, layout, gate, &suffix);
        for section in layout.sections_after_objectives.iter() {
            write_section(&mut w, dataset, record, section, &suffix);
        }
    }
    Ok(w.finish())
}

/// Renders the overall report: global statistics, then one section per goal index.
pub fn render_overall(
    summary: &Summary,
    group_count: usize,
    goals: &[GoalIndex],
    layout: &OverallLayout,
    vars: &TemplateVars,
) -> Result<String, RenderError> {
    let mut w = LatexWriter::begin(&layout.document, vars)?;
    write_summary(&mut w, &layout.summary_title, summary, Some(group_count));

    for gi in goals.iter() {
        if gi.goals.is_empty() && gi.omit_if_empty {
            debug!("render_overall: no goal for {:?}, section omitted", gi.title);
            continue;
        }
        w.section(&gi.title);
        for goal in gi.goals.iter() {
            w.subsection(&goal.goal);
            for c in goal.committees.iter() {
                w.subsubsection(&c.committee);
                for (k, o) in c.objectives.iter().enumerate() {
                    w.paragraph(&format!("Objective {}", k + 1), &o.description);
                    if let Some(x) = &o.work_done {
                        w.labeled("Work Done", x);
                    }
                    if let Some(x) = &o.work_planned {
                        w.labeled("Work Planned", x);
                    }
                    if let Some(x) = &o.achieved {
                        let mut line = format!("\\textbf{{Objective achieved:}} {}", escape_tex(x));
                        if let Some(target) = &o.target_date {
                            line.push_str(&format!(" (Target: {})", escape_tex(target)));
                        }
                        line.push_str("\n\n");
                        w.raw(&line);
                    }
                    if let Some(x) = &o.challenges {
                        w.labeled("Challenges", x);
                    }
                }
            }
        }
    }

    if let Some(footer) = &layout.footer {
        w.raw(&fill_template(footer, vars)?);
        w.raw("\n\n");
    }
    Ok(w.finish())
}

fn write_section(
    w: &mut LatexWriter,
    dataset: &Dataset,
    record: &Record,
    section: &SectionLayout,
    title_suffix: &str,
) {
    w.section(&format!("{}{}", section.title, title_suffix));
    let items = section_items(dataset, record, &section.items, None);
    write_items(w, &items);
}

// (label, LaTeX value) pairs of the items that are shown.
fn section_items(
    dataset: &Dataset,
    record: &Record,
    items: &[ItemSpec],
    objective: Option<u32>,
) -> Vec<(String, String)> {
    let mut res = Vec::new();
    for item in items.iter() {
        let pattern = match objective {
            Some(n) => item.column.instantiate(n),
            None => item.column.clone(),
        };
        let col = match dataset.find_column(&pattern) {
            Some(c) => c,
            None => continue,
        };
        let value = match record.get(col).as_text() {
            Some(v) => escape_tex(&v),
            None if item.skip_if_missing => continue,
            None => NOT_AVAILABLE.to_string(),
        };
        res.push((item.label.clone(), format!("{}{}", value, item.suffix)));
    }
    res
}

fn write_items(w: &mut LatexWriter, items: &[(String, String)]) {
    if items.is_empty() {
        // An itemize without items does not compile.
        w.raw("No information provided.\n\n");
        return;
    }
    w.begin_itemize();
    for (label, value) in items.iter() {
        w.item(label, value);
    }
    w.end_itemize();
}

fn write_objectives(
    w: &mut LatexWriter,
    dataset: &Dataset,
    record: &Record,
    layout: &CommitteeLayout,
    gate: &ObjectiveGate,
    title_suffix: &str,
) {
    w.section(&format!("{}{}", layout.objectives_title, title_suffix));
    let mut reported = 0;
    for n in 1..=gate.count {
        if n > 1 && !objective_present(dataset, record, gate, n) {
            continue;
        }
        let description = layout
            .objective_fields
            .first()
            .and_then(|f| dataset.find_column(&f.column.instantiate(n)))
            .and_then(|c| record.get(c).as_text());
        if description.is_none() {
            continue;
        }
        w.subsection(&format!("Objective {}", n));
        let items = section_items(dataset, record, &layout.objective_fields, Some(n));
        write_items(w, &items);
        reported += 1;
    }
    if reported == 0 {
        w.raw("No objectives reported.\n\n");
    }
}

fn objective_present(dataset: &Dataset, record: &Record, gate: &ObjectiveGate, n: u32) -> bool {
    match &gate.presence_column {
        None => true,
        Some(p) => match dataset.find_column(&p.instantiate(n)) {
            Some(c) => record
                .get(c)
                .as_text()
                .map(|v| v.trim().eq_ignore_ascii_case(gate.presence_value.trim()))
                .unwrap_or(false),
            None => false,
        },
    }
}

fn write_summary(
    w: &mut LatexWriter,
    title: &str,
    summary: &Summary,
    group_count: Option<usize>,
) {
    w.section(title);
    w.begin_itemize();
    w.item("Responses", &summary.record_count.to_string());
    if let Some(gc) = group_count {
        w.item("Committees", &gc.to_string());
    }
    for d in summary.distributions.iter() {
        w.item(&d.label, &distribution_text(d));
    }
    w.end_itemize();

    if summary.numeric.is_empty() {
        return;
    }
    let mut table = String::new();
    table.push_str("\\begin{center}\n\\begin{tabular}{lrrrr}\n\\hline\n");
    table.push_str("\\textbf{Statistic} & \\textbf{N} & \\textbf{Mean} & \\textbf{Min} & \\textbf{Max} \\\\\n\\hline\n");
    for n in summary.numeric.iter() {
        let unit = n.unit.as_deref().unwrap_or("");
        let mean = match n.mean {
            Some(m) => format!("{:.2}{}", m, unit),
            None => NOT_AVAILABLE.to_string(),
        };
        let bound = |x: Option<f64>| x.map(format_number).unwrap_or_else(|| "--".to_string());
        table.push_str(&format!(
            "{} & {} & {} & {} & {} \\\\\n",
            escape_tex_inline(&n.label),
            n.count,
            mean,
            bound(n.min),
            bound(n.max)
        ));
    }
    table.push_str("\\hline\n\\end{tabular}\n\\end{center}\n\n");
    w.raw(&table);
}

fn distribution_text(d: &Distribution) -> String {
    let mut parts: Vec<String> = d
        .counts
        .iter()
        .map(|(v, c)| format!("{} ({})", escape_tex(v), c))
        .collect();
    if parts.is_empty() {
        parts.push(NOT_AVAILABLE.to_string());
    }
    let mut res = parts.join(", ");
    if d.missing > 0 {
        res.push_str(&format!("; no answer ({})", d.missing));
    }
    res
}
