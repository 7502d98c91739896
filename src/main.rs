use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use epubtext::{ConvertConfig, DEFAULT_CONFIG_PATH, Epub, Result};

/// 📚 epubtext - 按目录顺序把EPUB转换为纯文本
#[derive(Parser)]
#[command(name = "epubtext")]
#[command(about = "按目录顺序把EPUB文件转换为纯文本")]
#[command(version)]
struct Args {
    /// EPUB文件或包含EPUB文件的目录
    #[arg(required_unless_present = "generate_config")]
    inputs: Vec<PathBuf>,

    /// 输出目录（默认与输入文件放在一起）
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 输出文件已存在时重新转换
    #[arg(long)]
    overwrite: bool,

    /// 转换成功后删除源EPUB文件
    #[arg(long)]
    delete_source: bool,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 生成默认配置文件后退出
    #[arg(long)]
    generate_config: bool,

    /// 内容文件缺失时跳过该条目而不是中止整本书
    #[arg(long)]
    skip_missing: bool,

    /// 只显示目录，不转换
    #[arg(short, long)]
    toc: bool,

    /// 详细输出模式
    #[arg(short, long)]
    verbose: bool,
}

/// 单个文件的处理结果
#[derive(Debug)]
enum Outcome {
    Converted {
        title: String,
        output: PathBuf,
        chars: usize,
        elapsed: Duration,
    },
    Skipped(PathBuf),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if args.generate_config {
        return match ConvertConfig::generate_default_config(&config_path) {
            Ok(()) => {
                println!("✅ 已生成配置文件: {}", config_path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ 错误: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut config = ConvertConfig::load_or_default(&config_path);
    if args.skip_missing {
        config.skip_missing_content = true;
    }

    let files = match collect_inputs(&args.inputs) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("❌ 无法读取输入: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if files.is_empty() {
        println!("没有找到需要处理的EPUB文件");
        return ExitCode::SUCCESS;
    }

    if args.toc {
        return display_tables_of_contents(&files, &config);
    }

    run_batch(&files, &args, &config)
}

/// 依次转换所有文件，单个文件失败不影响其余文件
fn run_batch(files: &[PathBuf], args: &Args, config: &ConvertConfig) -> ExitCode {
    let mut total_chars = 0usize;
    let mut total_time = Duration::ZERO;
    let mut converted = 0usize;
    let mut failed = 0usize;

    for path in files {
        println!("📖 正在处理 {}", path.display());
        match convert_file(
            path,
            args.output.as_deref(),
            config,
            args.overwrite,
            args.delete_source,
        ) {
            Ok(Outcome::Converted {
                title,
                output,
                chars,
                elapsed,
            }) => {
                println!("  书名: {}", title);
                println!(
                    "  用时 {:.2} 秒，写入 {}（{} 个字符）",
                    elapsed.as_secs_f64(),
                    output.display(),
                    chars
                );
                total_chars += chars;
                total_time += elapsed;
                converted += 1;
            }
            Ok(Outcome::Skipped(output)) => {
                println!("  {} 已存在，跳过", output.display());
            }
            Err(e) => {
                eprintln!("  ❌ 错误: {}", e);
                failed += 1;
            }
        }
    }

    if converted > 0 {
        println!(
            "🎉 转换完成：{} 个文件，共 {} 个字符，用时 {:.2} 秒",
            converted,
            total_chars,
            total_time.as_secs_f64()
        );
        if let Some(rate) = chars_per_second(total_chars, total_time) {
            println!("  速度: {:.0} 字符/秒", rate);
        }
    } else {
        println!("没有文件被转换");
    }

    if failed > 0 {
        eprintln!("⚠️  {} 个文件转换失败", failed);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// 只显示每本书的目录
fn display_tables_of_contents(files: &[PathBuf], config: &ConvertConfig) -> ExitCode {
    let mut failed = false;

    for path in files {
        println!("\n🌳 {}", path.display());
        let entries = Epub::new(path).and_then(|epub| epub.with_config(config.clone()).navigation());
        match entries {
            Ok(entries) => {
                for entry in &entries {
                    println!("  {}", entry);
                }
            }
            Err(e) => {
                eprintln!("  ❌ 错误: {}", e);
                failed = true;
            }
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// 展开输入参数：目录中的`.epub`文件按文件名排序
fn collect_inputs(inputs: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for dir_entry in fs::read_dir(input)? {
                let path = dir_entry?.path();
                if path.is_file() && is_epub(&path) {
                    found.push(path);
                }
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }

    Ok(files)
}

fn is_epub(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"))
}

/// 输出文件路径：扩展名换成`.txt`，指定了输出目录时放到该目录下
fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let txt = input.with_extension("txt");
    match (output_dir, txt.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => txt,
    }
}

/// 转换单个文件
fn convert_file(
    input: &Path,
    output_dir: Option<&Path>,
    config: &ConvertConfig,
    overwrite: bool,
    delete_source: bool,
) -> Result<Outcome> {
    let output = output_path(input, output_dir);
    if output.exists() && !overwrite {
        return Ok(Outcome::Skipped(output));
    }

    let start = Instant::now();
    let conversion = Epub::new(input)?
        .with_config(config.clone())
        .extract_text()?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(&output)?);
    conversion.output.write_to(&mut writer)?;
    writer.flush()?;

    if delete_source {
        fs::remove_file(input)?;
    }

    Ok(Outcome::Converted {
        title: conversion.descriptor.title,
        output,
        chars: conversion.output.char_count(),
        elapsed: start.elapsed(),
    })
}

fn chars_per_second(chars: usize, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        Some(chars as f64 / secs)
    } else {
        None
    }
}
