fn main() {
    integration_tests::recorder_main();
}
