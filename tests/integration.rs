// Integration tests module

mod integration {
    mod config_test;
    mod export_test;
    mod monitor_loop_test;
}
