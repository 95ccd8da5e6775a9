mod integration {
    mod common;

    mod app_tests;
    mod config_tests;
    mod index_tests;
    mod mover_tests;
    mod partition_scenarios;
    mod store_tests;
}
