fn main() {
    focstest::cli::run();
}
