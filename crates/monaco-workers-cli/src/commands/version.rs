use miette::Result;
use monaco_workers_core::version::version_string;

pub fn run() -> Result<()> {
    println!("{}", version_string());
    Ok(())
}
