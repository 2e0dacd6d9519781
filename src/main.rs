use file_summarizer::app;

fn main() {
    if let Err(err) = app::run() {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}
