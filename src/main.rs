use anyhow::Context;
use container_image::{ContainerFile, HostFile, OpenError, OpenFlags, OpenTarget};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        anyhow::bail!(
            "Usage: {} <image>",
            std::env::args().next().unwrap_or_else(|| "imginfo".into())
        );
    };

    let mut image = ContainerFile::new(HostFile::new());
    match image.open(
        OpenTarget::Path(unix_path::Path::new(&path)),
        OpenFlags::READ_ONLY,
    ) {
        Ok(()) => {}
        Err(e @ OpenError::UnsupportedContainer { .. }) => {
            anyhow::bail!("{path}: {e}");
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to open {path}")),
    }

    println!("format: {}", image.container_name());
    println!("size:   {} bytes", image.size());
    match image.chs() {
        Some(chs) => println!(
            "chs:    {}/{}/{}",
            chs.cylinders, chs.heads, chs.sectors
        ),
        None => println!("chs:    unavailable"),
    }

    image.close()?;
    Ok(())
}
