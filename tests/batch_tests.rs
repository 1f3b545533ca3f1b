use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clap::Parser;
use tempfile::TempDir;

use okvideo_cli::adapters::toml_config::Settings;
use okvideo_cli::app::container::AppContainer;
use okvideo_cli::cli::commands::{self, CommandContext};
use okvideo_cli::cli::Cli;
use okvideo_cli::config_initialization::apply_cli_overrides;
use okvideo_cli::ports::{Invocation, ProcessOutput, ProcessPort};
use okvideo_cli::*;

/// Test utilities standing in for ffmpeg, ffprobe and youtube-dl
mod test_utils {
    use super::*;

    /// Scripted tool layer recording every invocation
    ///
    /// ffmpeg writes three frames or an output file, ffprobe answers fixed
    /// stream values, youtube-dl writes the requested template. Inputs whose
    /// path contains `corrupt` make ffmpeg fail.
    #[derive(Default)]
    pub struct ScriptedTools {
        calls: Mutex<Vec<Invocation>>,
    }

    impl ScriptedTools {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_to(&self, program: &str) -> usize {
            self.calls().iter().filter(|c| c.program == program).count()
        }

        fn ok(stdout: &str) -> ProcessOutput {
            ProcessOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }
        }

        fn ffmpeg(args: &[String]) -> ProcessOutput {
            if args.iter().any(|a| a.contains("corrupt")) {
                return ProcessOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "moov atom not found\nInvalid data found when processing input\n"
                        .to_string(),
                };
            }
            let target = PathBuf::from(args.last().unwrap());
            if args.iter().any(|a| a == "image2") {
                let dir = target.parent().unwrap();
                for n in 1..=3 {
                    fs::write(dir.join(format!("{:06}.jpg", n)), b"jpg").unwrap();
                }
            } else {
                fs::write(&target, b"encoded").unwrap();
            }
            Self::ok("")
        }

        fn ffprobe(args: &[String]) -> ProcessOutput {
            let joined = args.join(" ");
            if joined.contains("stream=duration") {
                Self::ok("12.000000\n")
            } else if joined.contains("stream=avg_frame_rate") {
                Self::ok("25/1\n")
            } else if joined.contains("stream=height,width") {
                Self::ok("width=640\nheight=360\n")
            } else {
                Self::ok("300\n")
            }
        }

        fn youtube_dl(args: &[String]) -> ProcessOutput {
            let template = &args[args.len() - 2];
            fs::write(template.replace("%(ext)s", "mp4"), b"downloaded").unwrap();
            Self::ok("")
        }
    }

    #[async_trait]
    impl ProcessPort for ScriptedTools {
        async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, DomainError> {
            self.calls.lock().unwrap().push(invocation.clone());
            let args = invocation.args_lossy();
            Ok(match invocation.program.as_str() {
                "ffmpeg" => Self::ffmpeg(&args),
                "ffprobe" => Self::ffprobe(&args),
                "youtube-dl" => Self::youtube_dl(&args),
                other => panic!("unexpected program {}", other),
            })
        }
    }

    /// Parse a command line and build a context running on `tools`
    pub fn context(args: &[&str], tools: Arc<ScriptedTools>) -> (Cli, CommandContext) {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut settings = Settings::default();
        settings.fetch.backoff_base_ms = 1;
        settings.fetch.backoff_cap_ms = 1;
        apply_cli_overrides(&mut settings, &cli);
        let container = AppContainer::with_process(&settings, tools);
        (cli, CommandContext::new(container, settings))
    }

    pub fn write_manifest(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn report_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

use test_utils::*;

#[tokio::test]
async fn test_dump_frames_end_to_end() {
    let root = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    fs::write(root.path().join("a.mp4"), b"video").unwrap();
    fs::write(root.path().join("b.mp4"), b"video").unwrap();
    let manifest = write_manifest(work.path(), "videos.csv", "a.mp4\nmissing.mp4\nb.mp4\n");
    let out = work.path().join("frames");
    let summary = work.path().join("report.csv");

    let tools = ScriptedTools::new();
    let (cli, ctx) = context(
        &[
            "okvideo",
            "dump-frames",
            "-i",
            manifest.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "-s",
            summary.to_str().unwrap(),
            "-r",
            root.path().to_str().unwrap(),
            "-n",
            "2",
        ],
        tools.clone(),
    );

    let status = commands::execute(cli.command, &ctx).await.unwrap();
    assert_eq!(status, RunStatus::Partial);
    assert_eq!(
        report_lines(&summary),
        vec![
            "identifier,success,message",
            "a,true,3",
            "missing,false,Unexistent file",
            "b,true,3",
        ]
    );
    assert!(out.join("a").join("000001.jpg").is_file());
    assert_eq!(tools.calls_to("ffmpeg"), 2);
}

#[tokio::test]
async fn test_dump_frames_rerun_does_not_reinvoke_tools() {
    let root = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    fs::write(root.path().join("a.mp4"), b"video").unwrap();
    fs::write(root.path().join("b.mp4"), b"video").unwrap();
    let manifest = write_manifest(work.path(), "videos.csv", "a.mp4\nb.mp4\n");
    let out = work.path().join("frames");
    let args = [
        "okvideo",
        "dump-frames",
        "-i",
        manifest.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "-r",
        root.path().to_str().unwrap(),
    ];

    let first = ScriptedTools::new();
    let (cli, ctx) = context(&args, first.clone());
    assert_eq!(commands::execute(cli.command, &ctx).await.unwrap(), RunStatus::Clean);
    assert_eq!(first.calls_to("ffmpeg"), 2);

    let second = ScriptedTools::new();
    let (cli, ctx) = context(&args, second.clone());
    assert_eq!(commands::execute(cli.command, &ctx).await.unwrap(), RunStatus::Clean);
    assert_eq!(second.calls_to("ffmpeg"), 0);
    assert_eq!(
        report_lines(&out.join("report.csv"))[1..],
        ["a,true,3".to_string(), "b,true,3".to_string()]
    );
}

#[tokio::test]
async fn test_video_info_end_to_end() {
    let root = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("walking")).unwrap();
    fs::write(root.path().join("walking/a.mp4"), b"video").unwrap();
    let manifest = write_manifest(work.path(), "videos.csv", "walking/a.mp4\ngone.mp4\n");
    let stats = work.path().join("stats.csv");

    let (cli, ctx) = context(
        &[
            "okvideo",
            "video-info",
            "-i",
            manifest.to_str().unwrap(),
            "-o",
            stats.to_str().unwrap(),
            "-r",
            root.path().to_str().unwrap(),
        ],
        ScriptedTools::new(),
    );

    let status = commands::execute(cli.command, &ctx).await.unwrap();
    assert_eq!(status, RunStatus::Partial);
    assert_eq!(
        report_lines(&stats),
        vec![
            "video_name,duration,frame_rate,num_frames,width,height,status",
            "a.mp4,12.0,25.0,300,640,360,ok",
            "gone.mp4,,,,,,Unexistent file",
        ]
    );
}

#[tokio::test]
async fn test_edit_keeps_tree_and_reports_tool_errors() {
    let root = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("cat")).unwrap();
    fs::write(root.path().join("cat/a.mp4"), b"video").unwrap();
    fs::write(root.path().join("corrupt.mp4"), b"video").unwrap();
    let manifest = write_manifest(work.path(), "videos.tsv", "cat/a.mp4\ncorrupt.mp4\n");
    let out = work.path().join("edited");

    let (cli, ctx) = context(
        &[
            "okvideo",
            "edit",
            "-i",
            manifest.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "-r",
            root.path().to_str().unwrap(),
        ],
        ScriptedTools::new(),
    );

    let status = commands::execute(cli.command, &ctx).await.unwrap();
    assert_eq!(status, RunStatus::Partial);
    assert!(out.join("cat").join("a.mp4").is_file());
    assert_eq!(
        report_lines(&out.join("report.csv"))[1..],
        [
            "cat/a,true,success".to_string(),
            "corrupt,false,Invalid data found when processing input".to_string()
        ]
    );
}

#[tokio::test]
async fn test_crawl_end_to_end() {
    let work = TempDir::new().unwrap();
    let manifest = write_manifest(
        work.path(),
        "kinetics.csv",
        "youtube_id,time_start,time_end,label\n\
         aaaaaaaaaaa,,,walking\n\
         bbbbbbbbbbb,5,15,running\n\
         tooshort,0,10,jumping\n",
    );
    let out = work.path().join("clips");
    let scratch = work.path().join("scratch");

    let tools = ScriptedTools::new();
    let (cli, ctx) = context(
        &[
            "okvideo",
            "crawl",
            "-i",
            manifest.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--tmp-dir",
            scratch.to_str().unwrap(),
        ],
        tools.clone(),
    );

    let status = commands::execute(cli.command, &ctx).await.unwrap();
    assert_eq!(status, RunStatus::Partial);

    let report: Vec<StatusRecord> =
        serde_json::from_str(&fs::read_to_string(out.join("download_report.json")).unwrap())
            .unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report[0], StatusRecord::success("aaaaaaaaaaa", "Downloaded"));
    assert_eq!(report[1], StatusRecord::success("bbbbbbbbbbb", "Downloaded"));
    assert!(!report[2].success);

    assert!(out.join("aaaaaaaaaaa.mp4").is_file());
    assert!(out.join("bbbbbbbbbbb.mp4").is_file());
    assert_eq!(tools.calls_to("youtube-dl"), 2);
    assert_eq!(tools.calls_to("ffmpeg"), 1);
    assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
}

#[tokio::test]
async fn test_cancelled_run_still_writes_full_report() {
    let root = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    fs::write(root.path().join("a.mp4"), b"video").unwrap();
    let manifest = write_manifest(work.path(), "videos.csv", "a.mp4\nb.mp4\n");
    let out = work.path().join("frames");

    let tools = ScriptedTools::new();
    let (cli, ctx) = context(
        &[
            "okvideo",
            "dump-frames",
            "-i",
            manifest.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "-r",
            root.path().to_str().unwrap(),
        ],
        tools.clone(),
    );
    ctx.cancel.cancel();

    let status = commands::execute(cli.command, &ctx).await.unwrap();
    assert_eq!(status, RunStatus::Partial);
    assert!(tools.calls().is_empty());
    assert_eq!(
        report_lines(&out.join("report.csv"))[1..],
        ["a,false,cancelled".to_string(), "b,false,cancelled".to_string()]
    );
}

#[tokio::test]
async fn test_missing_manifest_is_fatal() {
    let work = TempDir::new().unwrap();
    let (cli, ctx) = context(
        &[
            "okvideo",
            "edit",
            "-i",
            work.path().join("nope.csv").to_str().unwrap(),
            "-o",
            work.path().join("out").to_str().unwrap(),
        ],
        ScriptedTools::new(),
    );

    let err = commands::execute(cli.command, &ctx).await.unwrap_err();
    assert_eq!(OkvideoError::exit_code_for(&err), okvideo_cli::error::EXIT_IO);
}
