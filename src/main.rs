fn main() {
    regress::cli::run();
}
