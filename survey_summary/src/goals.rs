//! The strategic goal index: for each goal, the committees whose objectives
//! support it, and those objectives.

pub use crate::config::*;

use log::debug;
use std::collections::BTreeMap;

/// Where to find the fields of objective `{n}`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ObjectiveColumns {
    pub description: ColumnPattern,
    pub work_done: ColumnPattern,
    pub work_planned: ColumnPattern,
    pub achieved: ColumnPattern,
    pub target_date: ColumnPattern,
    pub challenges: ColumnPattern,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GoalIndexSpec {
    pub title: String,
    /// The goal column of objective `{n}`.
    pub goal_column: ColumnPattern,
    /// Values that do not count as a goal (case-insensitive).
    pub excluded_values: Vec<String>,
    /// Do not render the section when no goal was found.
    pub omit_if_empty: bool,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ObjectiveEntry {
    pub description: String,
    pub work_done: Option<String>,
    pub work_planned: Option<String>,
    pub achieved: Option<String>,
    pub target_date: Option<String>,
    pub challenges: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CommitteeObjectives {
    pub committee: String,
    pub objectives: Vec<ObjectiveEntry>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GoalEntry {
    pub goal: String,
    /// Sorted by committee name.
    pub committees: Vec<CommitteeObjectives>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GoalIndex {
    pub title: String,
    pub omit_if_empty: bool,
    /// Sorted by goal.
    pub goals: Vec<GoalEntry>,
}

// The columns of one objective, as found in the header.
struct ResolvedObjective {
    goal: usize,
    description: Option<usize>,
    work_done: Option<usize>,
    work_planned: Option<usize>,
    achieved: Option<usize>,
    target_date: Option<usize>,
    challenges: Option<usize>,
}

/// Builds the goal index.
///
/// The goal column of every objective is required. A committee is listed under
/// a goal as soon as one of its objectives names that goal; the objective
/// itself is only listed when it has a description.
pub fn index_goals(
    dataset: &Dataset,
    committee_column: usize,
    objective_count: u32,
    spec: &GoalIndexSpec,
    columns: &ObjectiveColumns,
) -> Result<GoalIndex, SummaryError> {
    let mut resolved: Vec<ResolvedObjective> = Vec::new();
    for n in 1..=objective_count {
        let find = |p: &ColumnPattern| dataset.find_column(&p.instantiate(n));
        resolved.push(ResolvedObjective {
            goal: dataset.require_column(&spec.goal_column.instantiate(n))?,
            description: find(&columns.description),
            work_done: find(&columns.work_done),
            work_planned: find(&columns.work_planned),
            achieved: find(&columns.achieved),
            target_date: find(&columns.target_date),
            challenges: find(&columns.challenges),
        });
    }

    let excluded: Vec<String> = spec
        .excluded_values
        .iter()
        .map(|s| s.trim().to_lowercase())
        .collect();

    let mut index: BTreeMap<String, BTreeMap<String, Vec<ObjectiveEntry>>> = BTreeMap::new();
    for record in dataset.records().iter() {
        let committee = match record.get(committee_column).as_text() {
            Some(c) => c,
            None => continue,
        };
        for ro in resolved.iter() {
            let goal = match record.get(ro.goal).as_text() {
                Some(g) if !excluded.contains(&g.trim().to_lowercase()) => g,
                _ => continue,
            };
            let objectives = index
                .entry(goal)
                .or_default()
                .entry(committee.clone())
                .or_default();
            let field = |c: Option<usize>| c.and_then(|idx| record.get(idx).as_text());
            if let Some(description) = field(ro.description) {
                objectives.push(ObjectiveEntry {
                    description,
                    work_done: field(ro.work_done),
                    work_planned: field(ro.work_planned),
                    achieved: field(ro.achieved),
                    target_date: field(ro.target_date),
                    challenges: field(ro.challenges),
                });
            }
        }
    }

    debug!("index_goals: {:?}: {} goals", spec.title, index.len());
    Ok(GoalIndex {
        title: spec.title.clone(),
        omit_if_empty: spec.omit_if_empty,
        goals: index
            .into_iter()
            .map(|(goal, committees)| GoalEntry {
                goal,
                committees: committees
                    .into_iter()
                    .map(|(committee, objectives)| CommitteeObjectives {
                        committee,
                        objectives,
                    })
                    .collect(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DatasetBuilder;

    fn columns() -> ObjectiveColumns {
        ObjectiveColumns {
            description: ColumnPattern::contains(&["objective {n} - q1 "]),
            work_done: ColumnPattern::contains(&["objective {n} - q4 "]),
            work_planned: ColumnPattern::contains(&["objective {n} - q9 "]),
            achieved: ColumnPattern::contains(&["objective {n} - q7 "]),
            target_date: ColumnPattern::contains(&["objective {n} - q8 "]),
            challenges: ColumnPattern::contains(&["objective {n} - q10 "]),
        }
    }

    fn spec(excluded: &[&str]) -> GoalIndexSpec {
        GoalIndexSpec {
            title: "GOALS".to_string(),
            goal_column: ColumnPattern::contains(&["objective {n} - q2 "]),
            excluded_values: excluded.iter().map(|s| s.to_string()).collect(),
            omit_if_empty: false,
        }
    }

    fn dataset() -> Dataset {
        let header: Vec<String> = [
            "Committee",
            "Objective 1 - Q1 Describe",
            "Objective 1 - Q2 Goal",
            "Objective 1 -  Q4 Steps",
            "Objective 1 - Q10 Challenges",
            "Objective 2 - Q1 Describe",
            "Objective 2 - Q2 Goal",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mut b = DatasetBuilder::new(&header).unwrap();
        let t = CellValue::from_text;
        b.add_record(vec![t("Zeta"), t("Grow"), t("Membership"), t("Ran a drive"), t("N/A"), t("Talk"), t("Outreach")])
            .unwrap();
        b.add_record(vec![t("Alpha"), t("Teach"), t("Outreach"), t(""), t("Time"), t(""), t("None")])
            .unwrap();
        b.add_record(vec![t(""), t("Orphan"), t("Membership"), t(""), t(""), t(""), t("")])
            .unwrap();
        b.build()
    }

    #[test]
    fn goals_committees_objectives() {
        let ds = dataset();
        let gi = index_goals(&ds, 0, 2, &spec(&["none"]), &columns()).unwrap();
        let goals: Vec<&str> = gi.goals.iter().map(|g| g.goal.as_str()).collect();
        assert_eq!(goals, vec!["Membership", "Outreach"]);

        let outreach = &gi.goals[1];
        let committees: Vec<&str> = outreach
            .committees
            .iter()
            .map(|c| c.committee.as_str())
            .collect();
        assert_eq!(committees, vec!["Alpha", "Zeta"]);
        assert_eq!(outreach.committees[0].objectives[0].description, "Teach");
        assert_eq!(
            outreach.committees[0].objectives[0].challenges,
            Some("Time".to_string())
        );
        assert_eq!(outreach.committees[1].objectives[0].description, "Talk");

        let membership = &gi.goals[0].committees[0];
        assert_eq!(membership.committee, "Zeta");
        assert_eq!(
            membership.objectives[0].work_done,
            Some("Ran a drive".to_string())
        );
        assert_eq!(membership.objectives[0].challenges, None);
        assert_eq!(membership.objectives[0].work_planned, None);
    }

    #[test]
    fn excluded_values_are_not_goals() {
        let ds = dataset();
        let gi = index_goals(&ds, 0, 2, &spec(&[]), &columns()).unwrap();
        assert!(gi.goals.iter().any(|g| g.goal == "None"));
        let gi = index_goals(&ds, 0, 2, &spec(&["NONE"]), &columns()).unwrap();
        assert!(gi.goals.iter().all(|g| g.goal != "None"));
    }

    #[test]
    fn goal_column_is_required() {
        let ds = dataset();
        assert!(matches!(
            index_goals(&ds, 0, 3, &spec(&[]), &columns()),
            Err(SummaryError::MissingColumn(_))
        ));
    }
}
