mod backend;
mod config;
mod engine;
mod favorites;
mod library;
mod router;
mod runtime;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
