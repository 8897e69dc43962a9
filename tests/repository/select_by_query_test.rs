#[path = "../support/mod.rs"]
mod support;

#[cfg(test)]
mod tests {
    use super::support::*;
    use tally::model::Component;
    use tally::query::MeasureQueryBuilder;
    use tally::store::StoreError;
    use tally::{MeasureError, MeasureFact, MeasureQuery};

    const P2_LAST_ANALYSIS_UUID: &str = "P2_LAST_ANALYSIS";

    /// Two projects; project P1 has a module with files C1 and C2.
    fn fixture() -> Fixture {
        let fx = Fixture::new();
        let project1 = fx.insert_component(Component::project("org:p1").with_uuid("P1"));
        let module = fx.insert_component(Component::module(&project1, "org:p1:core").with_uuid("M"));
        fx.insert_component(Component::file(&module, "org:p1:core:One.rs").with_uuid("C1"));
        fx.insert_component(Component::file(&module, "org:p1:core:Two.rs").with_uuid("C2"));
        fx.insert_analysis(LAST_ANALYSIS_UUID, "P1", true);
        fx.insert_analysis(OTHER_ANALYSIS_UUID, "P1", false);

        fx.insert_component(Component::project("org:p2").with_uuid("P2"));
        fx.insert_analysis(P2_LAST_ANALYSIS_UUID, "P2", true);

        // project 1
        fx.insert_measure("P1_M1", LAST_ANALYSIS_UUID, "P1", NCLOC_METRIC_ID);
        fx.insert_measure("P1_M1", LAST_ANALYSIS_UUID, "P1", COVERAGE_METRIC_ID);
        fx.insert_measure("P1_M3", OTHER_ANALYSIS_UUID, "P1", NCLOC_METRIC_ID);
        // project 2
        fx.insert_measure("P2_M1", P2_LAST_ANALYSIS_UUID, "P2", NCLOC_METRIC_ID);
        fx.insert_measure("P2_M2", P2_LAST_ANALYSIS_UUID, "P2", COVERAGE_METRIC_ID);
        // component C1
        fx.insert_measure("M1", OTHER_ANALYSIS_UUID, "C1", NCLOC_METRIC_ID);
        fx.insert_measure("M2", LAST_ANALYSIS_UUID, "C1", NCLOC_METRIC_ID);
        fx.insert_measure("M3", LAST_ANALYSIS_UUID, "C1", COVERAGE_METRIC_ID);
        fx.insert_measure_on_person("M4", LAST_ANALYSIS_UUID, "C1", NCLOC_METRIC_ID, A_PERSON_ID);
        fx.insert_measure_on_person("M5", OTHER_ANALYSIS_UUID, "C1", NCLOC_METRIC_ID, 123);
        // component C2
        fx.insert_measure("M6", LAST_ANALYSIS_UUID, "C2", NCLOC_METRIC_ID);
        fx
    }

    fn select(fx: &Fixture, query: MeasureQueryBuilder) -> Vec<String> {
        ids(&fx.repository.select_by_query(&query.build().unwrap()).unwrap())
    }

    fn select_with_handler(fx: &Fixture, query: MeasureQueryBuilder) -> Vec<String> {
        let mut rows: Vec<MeasureFact> = Vec::new();
        fx.repository
            .select_by_query_with_handler(&query.build().unwrap(), |fact| {
                rows.push(fact);
                Ok(())
            })
            .unwrap();
        ids(&rows)
    }

    /// Runs every scenario through `select_fn`, so the list and handler
    /// modes are held to the same expectations.
    fn check_scenarios(fx: &Fixture, select_fn: fn(&Fixture, MeasureQueryBuilder) -> Vec<String>) {
        let q = MeasureQuery::builder;
        let none: Vec<String> = Vec::new();

        // scopes that match nothing
        assert_eq!(select_fn(fx, q().component_uuids("P1", Vec::<String>::new())), none);
        assert_eq!(select_fn(fx, q().component_uuid("MISSING_COMPONENT")), none);
        assert_eq!(select_fn(fx, q().project_uuids(Vec::<String>::new())), none);
        assert_eq!(select_fn(fx, q().project_uuids(["MISSING_COMPONENT"])), none);

        // all measures of C1
        assert_eq!(select_fn(fx, q().component_uuid("C1")), sorted(&["M2", "M3"]));
        assert_eq!(
            select_fn(fx, q().component_uuid("C1").analysis_uuid(OTHER_ANALYSIS_UUID)),
            sorted(&["M1"])
        );
        assert_eq!(
            select_fn(fx, q().component_uuid("C1").analysis_uuid(LAST_ANALYSIS_UUID)),
            sorted(&["M2", "M3"])
        );

        // ncloc of C1
        assert_eq!(
            select_fn(fx, q().component_uuid("C1").metric_id(NCLOC_METRIC_ID)),
            sorted(&["M2"])
        );
        assert_eq!(
            select_fn(
                fx,
                q().component_uuid("C1")
                    .analysis_uuid(OTHER_ANALYSIS_UUID)
                    .metric_id(NCLOC_METRIC_ID)
            ),
            sorted(&["M1"])
        );

        // several metrics of C1
        assert_eq!(
            select_fn(
                fx,
                q().component_uuid("C1")
                    .metric_ids([NCLOC_METRIC_ID, COVERAGE_METRIC_ID])
            ),
            sorted(&["M2", "M3"])
        );
        assert_eq!(
            select_fn(
                fx,
                q().component_uuid("C1")
                    .analysis_uuid(OTHER_ANALYSIS_UUID)
                    .metric_ids([NCLOC_METRIC_ID, COVERAGE_METRIC_ID])
            ),
            sorted(&["M1"])
        );

        // metric without facts
        assert_eq!(
            select_fn(fx, q().component_uuid("C1").metric_id(COMPLEXITY_METRIC_ID)),
            none
        );
        assert_eq!(
            select_fn(
                fx,
                q().component_uuid("C1")
                    .analysis_uuid(LAST_ANALYSIS_UUID)
                    .metric_id(COMPLEXITY_METRIC_ID)
            ),
            none
        );

        // components of P1, C3 does not exist
        assert_eq!(
            select_fn(fx, q().component_uuids("P1", ["C1", "C2", "C3"])),
            sorted(&["M2", "M3", "M6"])
        );
        assert_eq!(
            select_fn(
                fx,
                q().component_uuids("P1", ["C1", "C2", "C3"])
                    .analysis_uuid(OTHER_ANALYSIS_UUID)
            ),
            sorted(&["M1"])
        );

        // person 123 only has a fact in the other analysis
        assert_eq!(select_fn(fx, q().component_uuid("C1").person_id(123)), none);
        assert_eq!(
            select_fn(
                fx,
                q().component_uuid("C1")
                    .analysis_uuid(OTHER_ANALYSIS_UUID)
                    .person_id(123)
            ),
            sorted(&["M5"])
        );

        // developer facts of C1
        assert_eq!(
            select_fn(fx, q().component_uuid("C1").person_id(A_PERSON_ID)),
            sorted(&["M4"])
        );
        assert_eq!(
            select_fn(
                fx,
                q().component_uuid("C1")
                    .analysis_uuid(OTHER_ANALYSIS_UUID)
                    .person_id(A_PERSON_ID)
            ),
            none
        );

        // project facts at each project's last analysis
        assert_eq!(
            select_fn(fx, q().project_uuids(["P1"]).metric_id(NCLOC_METRIC_ID)),
            sorted(&["P1_M1"])
        );
        assert_eq!(
            select_fn(
                fx,
                q().project_uuids(["P1", "P2"])
                    .metric_ids([NCLOC_METRIC_ID, COVERAGE_METRIC_ID])
            ),
            sorted(&["P1_M1", "P1_M1", "P2_M1", "P2_M2"])
        );
        assert_eq!(
            select_fn(
                fx,
                q().project_uuids(["P1", "P2", "UNKNOWN"])
                    .metric_id(NCLOC_METRIC_ID)
            ),
            sorted(&["P1_M1", "P2_M1"])
        );

        // project facts of an explicit analysis
        assert_eq!(
            select_fn(
                fx,
                q().project_uuids(["P1"])
                    .metric_id(NCLOC_METRIC_ID)
                    .analysis_uuid(OTHER_ANALYSIS_UUID)
            ),
            sorted(&["P1_M3"])
        );
        assert_eq!(
            select_fn(
                fx,
                q().project_uuids(["P1", "P2"])
                    .metric_id(NCLOC_METRIC_ID)
                    .analysis_uuid(OTHER_ANALYSIS_UUID)
            ),
            sorted(&["P1_M3"])
        );
    }

    #[test]
    fn test_select_by_query() {
        let fx = fixture();
        check_scenarios(&fx, select);
    }

    #[test]
    fn test_select_by_query_with_handler() {
        let fx = fixture();
        check_scenarios(&fx, select_with_handler);
    }

    #[test]
    fn test_metric_keys_behave_like_ids() {
        let fx = fixture();
        let by_key = select(
            &fx,
            MeasureQuery::builder()
                .component_uuid("C1")
                .metric_keys(["ncloc", "unknown"]),
        );
        assert_eq!(by_key, sorted(&["M2"]));

        let unknown_only = select(
            &fx,
            MeasureQuery::builder()
                .component_uuid("C1")
                .metric_keys(["unknown"]),
        );
        assert!(unknown_only.is_empty());
    }

    #[test]
    fn test_no_scope_reads_every_last_analysis() {
        let fx = fixture();
        let all = select(&fx, MeasureQuery::builder().metric_id(NCLOC_METRIC_ID));
        assert_eq!(all, sorted(&["M2", "M6", "P1_M1", "P2_M1"]));

        let explicit = select(
            &fx,
            MeasureQuery::builder()
                .analysis_uuid(OTHER_ANALYSIS_UUID)
                .metric_id(NCLOC_METRIC_ID),
        );
        assert_eq!(explicit, sorted(&["M1", "P1_M3"]));
    }

    #[test]
    fn test_handler_error_stops_the_stream() {
        let fx = fixture();
        let query = MeasureQuery::builder().component_uuid("C1").build().unwrap();

        let mut seen = 0;
        let result = fx.repository.select_by_query_with_handler(&query, |_| {
            seen += 1;
            Err(MeasureError::handler("consumer gave up"))
        });

        assert!(matches!(result, Err(MeasureError::Handler(_))));
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_nested_query_from_handler_fails_fast() {
        let fx = fixture();
        let query = MeasureQuery::builder().component_uuid("C1").build().unwrap();
        let nested_repository = fx.repository.clone();

        let mut nested = Vec::new();
        fx.repository
            .select_by_query_with_handler(&query, |_| {
                nested.push(nested_repository.select_by_query(&query));
                Ok(())
            })
            .unwrap();

        assert!(!nested.is_empty());
        for result in &nested {
            let err = result.as_ref().unwrap_err();
            assert!(matches!(err, MeasureError::Store(StoreError::Reentrant)));
            assert!(err.is_caller_error());
        }

        // the store is usable again once the stream is over
        let rows = fx.repository.select_by_query(&query).unwrap();
        assert_eq!(rows.len(), nested.len());
    }

    #[test]
    fn test_select_single() {
        let fx = Fixture::new();
        let project = fx.insert_component(Component::project("org:app").with_uuid("P"));
        fx.insert_component(Component::file(&project, "org:app:Main.rs").with_uuid("C1"));
        fx.insert_analysis(LAST_ANALYSIS_UUID, "P", true);
        fx.insert_measure("M1", LAST_ANALYSIS_UUID, "C1", NCLOC_METRIC_ID);
        fx.insert_measure("M2", LAST_ANALYSIS_UUID, "C1", COMPLEXITY_METRIC_ID);

        let single = |query: MeasureQueryBuilder| fx.repository.select_single(&query.build().unwrap());

        assert!(single(MeasureQuery::builder().component_uuids("P", Vec::<String>::new()))
            .unwrap()
            .is_none());
        assert!(single(MeasureQuery::builder().component_uuid("MISSING_COMPONENT"))
            .unwrap()
            .is_none());

        let found = single(
            MeasureQuery::builder()
                .component_uuid("C1")
                .metric_id(NCLOC_METRIC_ID),
        )
        .unwrap()
        .unwrap();
        assert_eq!(found.text_value.as_deref(), Some("M1"));

        let err = single(MeasureQuery::builder().component_uuid("C1")).unwrap_err();
        assert!(matches!(err, MeasureError::TooManyResults { .. }));
        assert!(err.to_string().contains("expected one element"));
    }

    #[test]
    fn test_conflicting_scopes_rejected() {
        let result = MeasureQuery::builder()
            .component_uuid("C1")
            .project_uuids(["P1"])
            .build();
        assert!(matches!(result, Err(MeasureError::InvalidArgument(_))));

        let result = MeasureQuery::builder()
            .metric_id(NCLOC_METRIC_ID)
            .metric_key("ncloc")
            .build();
        assert!(matches!(result, Err(MeasureError::InvalidArgument(_))));
    }
}
