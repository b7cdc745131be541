use crate::camera::FrameSource;
use crate::cli::{clear_screen, AsciiRenderer, Presenter};
use crate::core::{Kiosk, KioskEvents};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Preview,
    Capture,
    Stop,
    File(PathBuf),
    Submit,
    Cancel,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "start" => Ok(Command::Start),
            "preview" => Ok(Command::Preview),
            "capture" => Ok(Command::Capture),
            "stop" => Ok(Command::Stop),
            "file" if rest.is_empty() => Err("usage: file <path>".to_string()),
            "file" => Ok(Command::File(PathBuf::from(rest))),
            "submit" | "auth" | "authenticate" => Ok(Command::Submit),
            "cancel" => Ok(Command::Cancel),
            "status" => Ok(Command::Status),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => Err(String::new()),
            other => Err(format!("unknown command '{}' (try 'help')", other)),
        }
    }
}

const HELP: &str = "\
Commands:
  start         start the camera
  preview       show the current camera frame
  capture       capture a photo (stops the camera)
  stop          stop the camera
  file <path>   use an image file instead
  submit        upload the pending image and authenticate
  cancel        cancel the authentication in progress
  status        show the current state
  quit          exit";

/// Interactive loop: stdin commands and finished submissions are handled as
/// they arrive, so the camera stays usable while a request is in flight.
pub async fn run<S: FrameSource>(
    mut kiosk: Kiosk<S>,
    mut events: KioskEvents,
    presenter: Presenter,
    renderer: AsciiRenderer,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}\n", HELP);
    presenter.print(kiosk.state());

    loop {
        prompt();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                let command = match Command::parse(&line) {
                    Ok(command) => command,
                    Err(msg) => {
                        if !msg.is_empty() {
                            println!("{}", msg);
                        }
                        continue;
                    }
                };

                match command {
                    Command::Start => {
                        tokio::task::block_in_place(|| kiosk.start_camera());
                        presenter.print(kiosk.state());
                    }
                    Command::Preview => {
                        match tokio::task::block_in_place(|| kiosk.preview_frame()) {
                            Ok(frame) => {
                                clear_screen().ok();
                                println!("{}", renderer.render(&frame, Some(" LIVE ")));
                            }
                            Err(e) => println!("Preview unavailable: {}", e),
                        }
                    }
                    Command::Capture => {
                        tokio::task::block_in_place(|| kiosk.capture_photo());
                        presenter.print(kiosk.state());
                    }
                    Command::Stop => {
                        kiosk.stop_camera();
                        println!("Camera stopped");
                    }
                    Command::File(path) => {
                        kiosk.select_file(&path);
                        presenter.print(kiosk.state());
                    }
                    Command::Submit => {
                        kiosk.submit();
                        presenter.print(kiosk.state());
                    }
                    Command::Cancel => {
                        if !kiosk.cancel() {
                            println!("Nothing to cancel");
                        }
                    }
                    Command::Status => {
                        presenter.print(kiosk.state());
                        println!("  Camera: {}", if kiosk.camera_active() { "on" } else { "off" });
                    }
                    Command::Help => println!("{}", HELP),
                    Command::Quit => break,
                }
            }
            Some(event) = events.next() => {
                println!();
                kiosk.apply(event);
                presenter.print(kiosk.state());
            }
        }
    }

    kiosk.shutdown();
    Ok(())
}

fn prompt() {
    print!("facegate> ");
    io::stdout().flush().ok();
}
