fn main() {
    pdf_canvas_cli::init_tracing();

    if let Err(error) = pdf_canvas_cli::run(std::env::args_os()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
