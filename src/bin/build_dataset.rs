use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    edema_dataset::apps::run_build_dataset(std::env::args().skip(1))
}
