use anyhow::{bail, Context, Result};
use cli::{Cli, Commands};
use office_to_pdf_core::{
    ConversionRequest, Converter, ConverterConfig, DocumentKind, RenderConfig, SheetSelection,
};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    office_to_pdf_core::init_logging();

    if let Err(e) = try_main().await {
        eprintln!("Error: {e:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_config(path: Option<&Path>) -> Result<ConverterConfig> {
    match path {
        Some(path) => ConverterConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(ConverterConfig::default()),
    }
}

async fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();

    match cli.command {
        Commands::Excel(args) => {
            let mut config = load_config(args.config.as_deref())?;
            if let Some(font) = args.font {
                config.layout.font_path = Some(font);
            }
            if let Some(sheet) = &args.sheet {
                config.layout.sheet = SheetSelection::parse(sheet);
            }
            let converter = Converter::new(config).context("Invalid configuration")?;

            let summary = match &args.dump_layout {
                Some(dump) => {
                    let (summary, canvas) = converter
                        .excel_to_pdf_recorded(&args.input, &args.output)
                        .with_context(|| format!("Failed to convert {}", args.input.display()))?;
                    std::fs::write(dump, canvas.to_json()?)
                        .with_context(|| format!("Failed to write {}", dump.display()))?;
                    info!("Layout written to {:?}", dump);
                    summary
                }
                None => converter
                    .excel_to_pdf(&args.input, &args.output)
                    .with_context(|| format!("Failed to convert {}", args.input.display()))?,
            };

            println!(
                "Conversion complete: {} to {} ({} page(s), {})",
                args.input.display(),
                args.output.display(),
                summary.page_count,
                if summary.dense { "table" } else { "sheet" }
            );
            Ok(())
        }
        Commands::Word(args) => run_office(args, DocumentKind::Word).await,
        Commands::Ppt(args) => run_office(args, DocumentKind::Presentation).await,
        Commands::PdfToImages(args) => {
            let mut config = load_config(args.config.as_deref())?;
            apply_resolution(&mut config.render, args.zoom, args.dpi);
            let converter = Converter::new(config).context("Invalid configuration")?;

            let result = converter
                .pdf_to_images(&args.input, &args.output_dir)
                .with_context(|| format!("Failed to render {}", args.input.display()))?;

            for path in &result.output_paths {
                println!("{}", path.display());
            }
            println!(
                "Conversion complete: {} to {} image(s)",
                args.input.display(),
                result.page_count
            );
            Ok(())
        }
        Commands::Convert(args) => {
            let mut config = load_config(args.config.as_deref())?;
            if let Some(font) = args.font {
                config.layout.font_path = Some(font);
            }
            let converter = Converter::new(config).context("Invalid configuration")?;

            let requests = args
                .inputs
                .iter()
                .map(|input| ConversionRequest::new(input, &args.out_dir))
                .collect();
            let batch = if args.jobs > 1 {
                converter.convert_parallel(requests, args.jobs).await
            } else {
                converter.convert_batch(requests).await
            };

            for result in &batch.successful {
                for path in &result.output_paths {
                    println!("{} -> {}", result.input_path.display(), path.display());
                }
            }
            for failure in &batch.failed {
                eprintln!("{}: {}", failure.input_path.display(), failure.error);
            }
            println!(
                "Converted {} of {} file(s), {} page(s) in {:?}",
                batch.successful.len(),
                batch.successful.len() + batch.failed.len(),
                batch.total_pages,
                batch.total_duration
            );

            if !batch.failed.is_empty() {
                bail!("{} file(s) failed to convert", batch.failed.len());
            }
            Ok(())
        }
    }
}

async fn run_office(args: cli::OfficeArgs, expected: DocumentKind) -> Result<()> {
    let kind = DocumentKind::from_path(&args.input)?;
    if kind != expected {
        bail!(
            "{} is a {:?} file, expected {:?}",
            args.input.display(),
            kind,
            expected
        );
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(soffice) = args.soffice {
        config.office.soffice_path = Some(soffice);
    }
    if let Some(secs) = args.timeout {
        config.office.conversion_timeout = Duration::from_secs(secs);
    }
    let converter = Converter::new(config).context("Invalid configuration")?;

    converter
        .office_to_pdf(&args.input, &args.output)
        .await
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    println!(
        "Conversion complete: {} to {}",
        args.input.display(),
        args.output.display()
    );
    Ok(())
}

/// Override only the resolution of a loaded render configuration.
fn apply_resolution(render: &mut RenderConfig, zoom: Option<f32>, dpi: Option<u32>) {
    if let Some(zoom) = zoom {
        render.dpi = RenderConfig::with_zoom(zoom).dpi;
    } else if let Some(dpi) = dpi {
        render.dpi = dpi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_render_config() -> RenderConfig {
        let mut render = RenderConfig::with_dpi(300).render_threads(3);
        render.png_compression = 9;
        render.use_alpha = true;
        render.background_color = (0, 0, 0);
        render
    }

    #[test]
    fn test_zoom_keeps_loaded_render_settings() {
        let mut render = loaded_render_config();
        apply_resolution(&mut render, Some(3.0), None);

        assert_eq!(render.dpi, 216);
        assert_eq!(render.png_compression, 9);
        assert!(render.use_alpha);
        assert_eq!(render.background_color, (0, 0, 0));
        assert_eq!(render.render_threads, 3);
    }

    #[test]
    fn test_dpi_keeps_loaded_render_settings() {
        let mut render = loaded_render_config();
        apply_resolution(&mut render, None, Some(96));

        assert_eq!(render.dpi, 96);
        assert_eq!(render.png_compression, 9);
    }

    #[test]
    fn test_no_resolution_flags_keep_config_dpi() {
        let mut render = loaded_render_config();
        apply_resolution(&mut render, None, None);
        assert_eq!(render.dpi, 300);
        assert_eq!(render.png_compression, 9);
    }
}
