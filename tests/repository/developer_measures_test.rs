#[path = "../support/mod.rs"]
mod support;

#[cfg(test)]
mod tests {
    use super::support::*;
    use tally::model::Component;

    const DEVELOPER_ID: i64 = 77;

    #[test]
    fn test_select_project_measures_of_developer() {
        let fx = Fixture::new();
        let dev = fx.insert_component(Component::developer("DEV").with_uuid("DEV"));
        fx.insert_analysis(LAST_ANALYSIS_UUID, &dev.uuid, true);
        fx.insert_analysis(PREVIOUS_ANALYSIS_UUID, &dev.uuid, false);

        let all_metrics = [NCLOC_METRIC_ID, COMPLEXITY_METRIC_ID, COVERAGE_METRIC_ID];
        assert!(fx
            .repository
            .select_project_measures_of_developer(DEVELOPER_ID, &all_metrics)
            .unwrap()
            .is_empty());

        let project = fx.insert_component(Component::project("org:app"));
        let view = fx.insert_component(Component::view("org:portfolio"));
        let disabled = fx.insert_component(Component::project("org:gone").with_enabled(false));
        let module = fx.insert_component(Component::module(&project, "org:app:core"));

        let metrics = [NCLOC_METRIC_ID, COMPLEXITY_METRIC_ID, COVERAGE_METRIC_ID];
        for (i, metric) in metrics.into_iter().enumerate() {
            let n = i + 1;
            fx.insert_measure(&format!("M{n}"), LAST_ANALYSIS_UUID, &project.uuid, metric);
            fx.insert_measure(&format!("M{}", n + 3), PREVIOUS_ANALYSIS_UUID, &project.uuid, metric);
            fx.insert_measure_on_person(
                &format!("M1{n}"),
                LAST_ANALYSIS_UUID,
                &project.uuid,
                metric,
                DEVELOPER_ID,
            );
            fx.insert_measure_on_person(
                &format!("M1{}", n + 3),
                PREVIOUS_ANALYSIS_UUID,
                &project.uuid,
                metric,
                DEVELOPER_ID,
            );
            fx.insert_measure(&format!("M5{n}"), LAST_ANALYSIS_UUID, &view.uuid, metric);
            fx.insert_measure_on_person(
                &format!("M5{}", n + 3),
                LAST_ANALYSIS_UUID,
                &disabled.uuid,
                metric,
                DEVELOPER_ID,
            );
            // not a top-level component
            fx.insert_measure_on_person(
                &format!("M9{n}"),
                LAST_ANALYSIS_UUID,
                &module.uuid,
                metric,
                DEVELOPER_ID,
            );
        }

        let rows = fx
            .repository
            .select_project_measures_of_developer(DEVELOPER_ID, &all_metrics)
            .unwrap();
        assert_eq!(
            ids(&rows),
            sorted(&["M11", "M12", "M13", "M54", "M55", "M56"])
        );
        assert!(rows.iter().all(|f| f.person_id == Some(DEVELOPER_ID)));

        let rows = fx
            .repository
            .select_project_measures_of_developer(DEVELOPER_ID, &[NCLOC_METRIC_ID])
            .unwrap();
        assert_eq!(ids(&rows), sorted(&["M11", "M54"]));
    }

    #[test]
    fn test_empty_metric_set_returns_nothing() {
        let fx = Fixture::new();
        let project = fx.insert_component(Component::project("org:app"));
        fx.insert_analysis(LAST_ANALYSIS_UUID, &project.uuid, true);
        fx.insert_measure_on_person("M1", LAST_ANALYSIS_UUID, &project.uuid, NCLOC_METRIC_ID, DEVELOPER_ID);

        assert!(fx
            .repository
            .select_project_measures_of_developer(DEVELOPER_ID, &[])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_select_past_measures() {
        let fx = Fixture::new();
        let project = fx.insert_component(Component::project("org:app").with_uuid("P"));
        fx.insert_analysis(LAST_ANALYSIS_UUID, "P", true);
        fx.insert_analysis(PREVIOUS_ANALYSIS_UUID, "P", false);

        fx.insert_measure("NOW", LAST_ANALYSIS_UUID, &project.uuid, NCLOC_METRIC_ID);
        fx.insert_measure("BEFORE", PREVIOUS_ANALYSIS_UUID, &project.uuid, NCLOC_METRIC_ID);
        fx.insert_measure("BEFORE_COV", PREVIOUS_ANALYSIS_UUID, &project.uuid, COVERAGE_METRIC_ID);
        fx.insert_measure_on_person("DEV", PREVIOUS_ANALYSIS_UUID, &project.uuid, NCLOC_METRIC_ID, DEVELOPER_ID);

        let past = fx
            .repository
            .select_past_measures("P", PREVIOUS_ANALYSIS_UUID, &[NCLOC_METRIC_ID])
            .unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].metric_id, NCLOC_METRIC_ID);

        let past = fx
            .repository
            .select_past_measures("P", PREVIOUS_ANALYSIS_UUID, &[NCLOC_METRIC_ID, COVERAGE_METRIC_ID])
            .unwrap();
        let mut metric_ids: Vec<i32> = past.iter().map(|p| p.metric_id).collect();
        metric_ids.sort_unstable();
        assert_eq!(metric_ids, vec![COVERAGE_METRIC_ID, NCLOC_METRIC_ID]);

        assert!(fx
            .repository
            .select_past_measures("P", PREVIOUS_ANALYSIS_UUID, &[])
            .unwrap()
            .is_empty());
    }
}
