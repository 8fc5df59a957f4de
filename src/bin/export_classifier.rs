use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    edema_dataset::apps::run_export_classifier(std::env::args().skip(1))
}
