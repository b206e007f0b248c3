use crate::report::*;

use serde::{Deserialize, Serialize};

use survey_summary::goals::{GoalIndexSpec, ObjectiveColumns};
use survey_summary::latex::{check_template, DocumentSettings, Package, PLACEHOLDERS};
use survey_summary::render::{CommitteeLayout, ItemSpec, ObjectiveGate, OverallLayout, SectionLayout};

/// The configuration used when no `--config` is given.
pub const DEFAULT_CONFIG: &str = include_str!("default_config.json");

/// A column, as written in the configuration: a name, a list of words that
/// must all appear in the name, or a list of alternatives.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnConfig {
    Exact(String),
    Contains(Vec<String>),
    AnyOf {
        #[serde(rename = "anyOf")]
        any_of: Vec<ColumnConfig>,
    },
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StatisticConfig {
    pub label: String,
    pub column: ColumnConfig,
    pub kind: String,
    pub unit: Option<String>,
    pub optional: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ObjectivesConfig {
    pub count: u32,
    #[serde(rename = "presenceColumn")]
    pub presence_column: Option<ColumnConfig>,
    #[serde(rename = "presenceValue")]
    pub presence_value: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    pub name: String,
    pub options: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(rename = "documentClass")]
    pub document_class: Option<String>,
    pub packages: Option<Vec<PackageConfig>>,
    pub preamble: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ItemConfig {
    pub label: String,
    pub column: ColumnConfig,
    pub suffix: Option<String>,
    #[serde(rename = "skipIfMissing")]
    pub skip_if_missing: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub title: String,
    pub items: Vec<ItemConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GoalSectionConfig {
    pub title: String,
    #[serde(rename = "goalColumn")]
    pub goal_column: ColumnConfig,
    #[serde(rename = "excludeValues")]
    pub exclude_values: Option<Vec<String>>,
    #[serde(rename = "omitIfEmpty")]
    pub omit_if_empty: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveColumnsConfig {
    pub description: ColumnConfig,
    #[serde(rename = "workDone")]
    pub work_done: ColumnConfig,
    #[serde(rename = "workPlanned")]
    pub work_planned: ColumnConfig,
    pub achieved: ColumnConfig,
    #[serde(rename = "targetDate")]
    pub target_date: ColumnConfig,
    pub challenges: ColumnConfig,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OverallConfig {
    pub document: DocumentConfig,
    #[serde(rename = "summaryTitle")]
    pub summary_title: Option<String>,
    #[serde(rename = "goalSections")]
    pub goal_sections: Vec<GoalSectionConfig>,
    #[serde(rename = "objectiveColumns")]
    pub objective_columns: ObjectiveColumnsConfig,
    pub footer: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeConfig {
    pub document: DocumentConfig,
    #[serde(rename = "infoSection")]
    pub info_section: SectionConfig,
    #[serde(rename = "summaryTitle")]
    pub summary_title: Option<String>,
    #[serde(rename = "sectionsBeforeObjectives")]
    pub sections_before_objectives: Vec<SectionConfig>,
    #[serde(rename = "objectivesTitle")]
    pub objectives_title: Option<String>,
    #[serde(rename = "objectiveFields")]
    pub objective_fields: Vec<ItemConfig>,
    #[serde(rename = "sectionsAfterObjectives")]
    pub sections_after_objectives: Vec<SectionConfig>,
    #[serde(rename = "fileSuffix")]
    pub file_suffix: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(rename = "groupColumn")]
    pub group_column: ColumnConfig,
    #[serde(rename = "yearColumn")]
    pub year_column: Option<ColumnConfig>,
    #[serde(rename = "periodColumn")]
    pub period_column: Option<ColumnConfig>,
    #[serde(rename = "defaultYear")]
    pub default_year: Option<String>,
    #[serde(rename = "defaultPeriod")]
    pub default_period: Option<String>,
    pub statistics: Vec<StatisticConfig>,
    pub objectives: ObjectivesConfig,
    pub overall: OverallConfig,
    pub committee: CommitteeConfig,
}

/// The overall report, ready to be used.
#[derive(PartialEq, Debug, Clone)]
pub struct OverallSettings {
    pub layout: OverallLayout,
    pub goal_sections: Vec<GoalIndexSpec>,
    pub objective_columns: ObjectiveColumns,
}

/// A validated configuration.
#[derive(PartialEq, Debug, Clone)]
pub struct ReportSettings {
    pub group_column: ColumnPattern,
    pub year_column: Option<ColumnPattern>,
    pub period_column: Option<ColumnPattern>,
    pub default_year: String,
    pub default_period: String,
    pub stats: Vec<StatSpec>,
    pub gate: ObjectiveGate,
    pub overall: OverallSettings,
    pub committee: CommitteeLayout,
    pub file_suffix: String,
}

pub fn read_config(path: &str) -> ReportResult<ReportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ReportConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn default_config() -> ReportResult<ReportConfig> {
    serde_json::from_str(DEFAULT_CONFIG).context(ParsingJsonSnafu { path: "<default>" })
}

/// Reads the given configuration file, or the built-in one.
pub fn load_settings(path: &Option<String>) -> ReportResult<ReportSettings> {
    let config = match path {
        Some(p) => read_config(p)?,
        None => default_config()?,
    };
    validate_config(&config)
}

pub fn validate_config(config: &ReportConfig) -> ReportResult<ReportSettings> {
    let stats = config
        .statistics
        .iter()
        .map(validate_statistic)
        .collect::<ReportResult<Vec<StatSpec>>>()?;

    let objectives = &config.objectives;
    if objectives.count == 0 {
        whatever!("objectives.count must be at least 1");
    }
    let gate = ObjectiveGate {
        count: objectives.count,
        presence_column: match &objectives.presence_column {
            Some(c) => Some(validate_column(c)?),
            None => None,
        },
        presence_value: objectives
            .presence_value
            .clone()
            .unwrap_or_else(|| "Yes".to_string()),
    };

    let overall = &config.overall;
    if let Some(footer) = &overall.footer {
        validate_template("overall.footer", footer)?;
    }
    let goal_sections = overall
        .goal_sections
        .iter()
        .map(|gs| -> ReportResult<GoalIndexSpec> {
            Ok(GoalIndexSpec {
                title: gs.title.clone(),
                goal_column: validate_column(&gs.goal_column)?,
                excluded_values: gs.exclude_values.clone().unwrap_or_default(),
                omit_if_empty: gs.omit_if_empty.unwrap_or(false),
            })
        })
        .collect::<ReportResult<Vec<GoalIndexSpec>>>()?;
    let oc = &overall.objective_columns;
    let overall_settings = OverallSettings {
        layout: OverallLayout {
            document: validate_document("overall.document", &overall.document)?,
            summary_title: overall
                .summary_title
                .clone()
                .unwrap_or_else(|| "Summary Statistics".to_string()),
            footer: overall.footer.clone(),
        },
        goal_sections,
        objective_columns: ObjectiveColumns {
            description: validate_column(&oc.description)?,
            work_done: validate_column(&oc.work_done)?,
            work_planned: validate_column(&oc.work_planned)?,
            achieved: validate_column(&oc.achieved)?,
            target_date: validate_column(&oc.target_date)?,
            challenges: validate_column(&oc.challenges)?,
        },
    };

    let committee = &config.committee;
    if committee.objective_fields.is_empty() {
        whatever!("committee.objectiveFields must start with the objective description");
    }
    let committee_layout = CommitteeLayout {
        document: validate_document("committee.document", &committee.document)?,
        info_section: validate_section(&committee.info_section)?,
        summary_title: committee
            .summary_title
            .clone()
            .unwrap_or_else(|| "Summary Statistics".to_string()),
        sections_before_objectives: committee
            .sections_before_objectives
            .iter()
            .map(validate_section)
            .collect::<ReportResult<Vec<SectionLayout>>>()?,
        objectives_title: committee
            .objectives_title
            .clone()
            .unwrap_or_else(|| "Objectives".to_string()),
        objective_fields: committee
            .objective_fields
            .iter()
            .map(validate_item)
            .collect::<ReportResult<Vec<ItemSpec>>>()?,
        sections_after_objectives: committee
            .sections_after_objectives
            .iter()
            .map(validate_section)
            .collect::<ReportResult<Vec<SectionLayout>>>()?,
    };

    Ok(ReportSettings {
        group_column: validate_column(&config.group_column)?,
        year_column: match &config.year_column {
            Some(c) => Some(validate_column(c)?),
            None => None,
        },
        period_column: match &config.period_column {
            Some(c) => Some(validate_column(c)?),
            None => None,
        },
        default_year: config.default_year.clone().unwrap_or_default(),
        default_period: config.default_period.clone().unwrap_or_default(),
        stats,
        gate,
        overall: overall_settings,
        committee: committee_layout,
        file_suffix: committee
            .file_suffix
            .clone()
            .unwrap_or_else(|| "_report".to_string()),
    })
}

fn validate_column(c: &ColumnConfig) -> ReportResult<ColumnPattern> {
    match c {
        ColumnConfig::Exact(name) if name.trim().is_empty() => {
            whatever!("empty column name in the configuration")
        }
        ColumnConfig::Exact(name) => Ok(ColumnPattern::Exact(name.clone())),
        ColumnConfig::Contains(needles) if needles.is_empty() => {
            whatever!("empty list of words for a column in the configuration")
        }
        ColumnConfig::Contains(needles) => Ok(ColumnPattern::Contains(needles.clone())),
        ColumnConfig::AnyOf { any_of } if any_of.is_empty() => {
            whatever!("empty anyOf for a column in the configuration")
        }
        ColumnConfig::AnyOf { any_of } => Ok(ColumnPattern::AnyOf(
            any_of
                .iter()
                .map(validate_column)
                .collect::<ReportResult<Vec<ColumnPattern>>>()?,
        )),
    }
}

fn validate_statistic(s: &StatisticConfig) -> ReportResult<StatSpec> {
    let kind = match s.kind.as_str() {
        "mean" => StatKind::Mean,
        "distribution" => StatKind::Distribution,
        x => {
            whatever!(
                "Statistic {:?}: unknown kind {:?} (expected mean or distribution)",
                s.label,
                x
            )
        }
    };
    Ok(StatSpec {
        label: s.label.clone(),
        column: validate_column(&s.column)?,
        kind,
        unit: s.unit.clone(),
        optional: s.optional.unwrap_or(false),
    })
}

fn validate_item(i: &ItemConfig) -> ReportResult<ItemSpec> {
    Ok(ItemSpec {
        label: i.label.clone(),
        column: validate_column(&i.column)?,
        suffix: i.suffix.clone().unwrap_or_default(),
        skip_if_missing: i.skip_if_missing.unwrap_or(false),
    })
}

fn validate_section(s: &SectionConfig) -> ReportResult<SectionLayout> {
    Ok(SectionLayout {
        title: s.title.clone(),
        items: s
            .items
            .iter()
            .map(validate_item)
            .collect::<ReportResult<Vec<ItemSpec>>>()?,
    })
}

fn validate_template(field: &str, template: &str) -> ReportResult<()> {
    if let Err(e) = check_template(template, &PLACEHOLDERS) {
        whatever!("{}: {}", field, e);
    }
    Ok(())
}

fn validate_document(field: &str, d: &DocumentConfig) -> ReportResult<DocumentSettings> {
    let author = d.author.clone().unwrap_or_default();
    let date = d.date.clone().unwrap_or_else(|| "{{date}}".to_string());
    validate_template(&format!("{}.title", field), &d.title)?;
    validate_template(&format!("{}.author", field), &author)?;
    validate_template(&format!("{}.date", field), &date)?;
    Ok(DocumentSettings {
        document_class: d
            .document_class
            .clone()
            .unwrap_or_else(|| "article".to_string()),
        packages: d
            .packages
            .iter()
            .flatten()
            .map(|p| Package {
                name: p.name.clone(),
                options: p.options.clone(),
            })
            .collect(),
        preamble: d.preamble.clone().unwrap_or_default(),
        title: d.title.clone(),
        author,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = default_config().unwrap();
        let settings = validate_config(&config).unwrap();
        assert_eq!(
            settings.group_column,
            ColumnPattern::exact("Committee, Group, or Task Force")
        );
        assert_eq!(settings.gate.count, 4);
        assert_eq!(settings.overall.goal_sections.len(), 2);
        assert!(settings.overall.goal_sections[1].omit_if_empty);
        assert_eq!(settings.committee.objective_fields.len(), 10);
        assert_eq!(settings.committee.sections_before_objectives.len(), 2);
        assert!(settings.stats.iter().all(|s| s.optional));
        assert_eq!(settings.file_suffix, "_report");
    }

    #[test]
    fn column_forms() {
        let js = r#"["exact", ["a", "b"], {"anyOf": [["x"], "y"]}]"#;
        let cols: Vec<ColumnConfig> = serde_json::from_str(js).unwrap();
        assert_eq!(validate_column(&cols[0]).unwrap(), ColumnPattern::exact("exact"));
        assert_eq!(
            validate_column(&cols[1]).unwrap(),
            ColumnPattern::contains(&["a", "b"])
        );
        assert_eq!(
            validate_column(&cols[2]).unwrap(),
            ColumnPattern::AnyOf(vec![
                ColumnPattern::contains(&["x"]),
                ColumnPattern::exact("y")
            ])
        );
        assert!(validate_column(&ColumnConfig::Contains(vec![])).is_err());
    }

    #[test]
    fn invalid_configurations() {
        let mut config = default_config().unwrap();
        config.statistics[0].kind = "median".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = default_config().unwrap();
        config.objectives.count = 0;
        assert!(validate_config(&config).is_err());

        let mut config = default_config().unwrap();
        config.committee.document.title = "Report for {{committee}}".to_string();
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("committee.document.title"));

        let mut config = default_config().unwrap();
        config.overall.footer = Some("{{generated".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn optional_fields_have_defaults() {
        let js = r#"{
            "groupColumn": "Committee",
            "statistics": [{"label": "Score", "column": "Score", "kind": "mean"}],
            "objectives": {"count": 1},
            "overall": {
                "document": {"title": "All"},
                "goalSections": [],
                "objectiveColumns": {
                    "description": "D", "workDone": "W", "workPlanned": "P",
                    "achieved": "A", "targetDate": "T", "challenges": "C"
                }
            },
            "committee": {
                "document": {"title": "{{group}}"},
                "infoSection": {"title": "Info", "items": []},
                "sectionsBeforeObjectives": [],
                "objectiveFields": [{"label": "Description", "column": "D"}],
                "sectionsAfterObjectives": []
            }
        }"#;
        let config: ReportConfig = serde_json::from_str(js).unwrap();
        let settings = validate_config(&config).unwrap();
        assert!(!settings.stats[0].optional);
        assert_eq!(settings.gate.presence_column, None);
        assert_eq!(settings.committee.document.document_class, "article");
        assert_eq!(settings.committee.document.date, "{{date}}");
        assert_eq!(settings.committee.objectives_title, "Objectives");
        assert_eq!(settings.year_column, None);
        assert_eq!(settings.overall.layout.footer, None);
    }
}
