use anyhow::Result;
use clap::Parser;
use colored::*;
use std::io::{self, Write};
use std::path::PathBuf;

use quill::ai::{self, AiError};
use quill::config::{self, Config};
use quill::git;
use quill::session::Session;
use quill::store;
use quill::vault::{self, VaultError};

#[derive(Parser)]
#[command(name = "quill", version, about = "AI-assisted git commit helper")]
struct Args {
    /// Repository to open at startup
    #[arg(short, long)]
    repo: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load_or_create()?;

    let favorites_path = config::favorites_path()?;
    let profiles_path = config::profiles_path()?;
    let credential_path = config::credential_path()?;

    let mut favorites = store::load_list(&favorites_path);
    let mut profiles = store::load_profiles(&profiles_path);
    let mut session = Session::new();
    let mut repo: Option<PathBuf> = None;

    if let Some(path) = args.repo {
        if git::is_git_repo(&path) {
            repo = Some(path);
        } else {
            eprintln!("{}: {:?} is not a git repository", "Error".red().bold(), path);
        }
    }

    if !git::git_available() {
        eprintln!(
            "{}: git was not found in PATH; repository commands will fail",
            "Warning".yellow().bold()
        );
    }

    println!("{}", "Quill - AI commit assistant".green().bold());
    if store::load_secret(&credential_path).is_some() {
        println!("An encrypted API key is saved. Use 'unlock' to load it.");
    } else {
        println!("No API key saved yet. Use 'set-key' to store one.");
    }
    println!("Type 'help' for commands, 'exit' to quit\n");

    loop {
        print!("quill> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            continue;
        };

        match command {
            "exit" | "quit" => break,
            "help" => print_help(),
            "repo" => {
                let Some(path) = parts.get(1) else {
                    eprintln!("Usage: repo <path>");
                    continue;
                };
                let path = PathBuf::from(path);
                if git::is_git_repo(&path) {
                    println!("Selected repo: {}", path.display());
                    repo = Some(path);
                } else {
                    eprintln!("{}: not a git repository", "Error".red().bold());
                }
            }
            "status" => run_in_repo(&repo, &["status"]).await,
            "log" => run_in_repo(&repo, &["log", "--oneline", "-20"]).await,
            "diff" => {
                let Some(current) = require_repo(&repo) else {
                    continue;
                };
                let status = git::run_git(&["status", "-s"], &current);
                let diff = git::run_git(&["diff", "--stat"], &current);
                if status.stdout.is_empty() {
                    println!("Changed files: none");
                } else {
                    println!("Changed files:\n{}", status.stdout);
                }
                if diff.stdout.is_empty() {
                    println!("Diff summary: clean");
                } else {
                    println!("Diff summary:\n{}", diff.stdout);
                }
            }
            "stage" => run_in_repo(&repo, &["add", "-A"]).await,
            "commit" => {
                let message = parts[1..].join(" ");
                if message.is_empty() {
                    eprintln!("Usage: commit <message>");
                    continue;
                }
                run_in_repo(&repo, &["commit", "-m", message.as_str()]).await;
            }
            "clone" => {
                let (Some(url), Some(dest)) = (parts.get(1), parts.get(2)) else {
                    eprintln!("Usage: clone <url> <dest-dir>");
                    continue;
                };
                let dest = PathBuf::from(dest);
                if !dest.is_dir() {
                    eprintln!("{}: destination folder does not exist", "Error".red().bold());
                    continue;
                }
                let target = dest.join(git::derive_repo_name(url));
                if target.exists() {
                    eprintln!("{}: {:?} already exists", "Error".red().bold(), target);
                    continue;
                }
                let url = url.to_string();
                let target_str = target.to_string_lossy().to_string();
                let out = tokio::task::spawn_blocking(move || {
                    git::run_git(&["clone", url.as_str(), target_str.as_str()], &dest)
                })
                .await?;
                print_git_output(&out);
            }
            "fav" => match parts.get(1).copied() {
                Some("list") | None => {
                    if favorites.is_empty() {
                        println!("No favorites saved.");
                    }
                    for (i, path) in favorites.iter().enumerate() {
                        println!("{:3}  {}", i + 1, path);
                    }
                }
                Some("add") => {
                    let Some(current) = require_repo(&repo) else {
                        continue;
                    };
                    let path = current.to_string_lossy().to_string();
                    if !favorites.contains(&path) {
                        favorites.push(path);
                        if let Err(e) = store::save_list(&favorites_path, &favorites) {
                            eprintln!("{}: {}", "Error".red().bold(), e);
                        } else {
                            println!("Favorite added.");
                        }
                    }
                }
                Some("rm") => {
                    let Some(path) = parts.get(2) else {
                        eprintln!("Usage: fav rm <path>");
                        continue;
                    };
                    favorites.retain(|p| p != path);
                    if let Err(e) = store::save_list(&favorites_path, &favorites) {
                        eprintln!("{}: {}", "Error".red().bold(), e);
                    } else {
                        println!("Favorite removed.");
                    }
                }
                Some("load") => {
                    let selected = parts
                        .get(2)
                        .and_then(|n| n.parse::<usize>().ok())
                        .and_then(|n| favorites.get(n.wrapping_sub(1)));
                    let Some(path) = selected else {
                        eprintln!("Usage: fav load <number> (see 'fav list')");
                        continue;
                    };
                    let path = PathBuf::from(path);
                    if git::is_git_repo(&path) {
                        println!("Selected repo: {}", path.display());
                        repo = Some(path);
                    } else {
                        eprintln!("{}: favorite is not a git repository", "Error".red().bold());
                    }
                }
                Some(other) => eprintln!("Unknown fav command: {}", other),
            },
            "profile" => match parts.get(1).copied() {
                Some("list") | None => {
                    if profiles.is_empty() {
                        println!("No profiles saved.");
                    }
                    for (name, profile) in &profiles {
                        println!("{}  {} ({} / {})", name, profile.path, profile.remote, profile.branch);
                    }
                }
                Some("save") => {
                    let Some(name) = parts.get(2) else {
                        eprintln!("Usage: profile save <name> [remote]");
                        continue;
                    };
                    let Some(current) = require_repo(&repo) else {
                        continue;
                    };
                    let profile = store::Profile {
                        path: current.to_string_lossy().to_string(),
                        remote: parts.get(3).unwrap_or(&"origin").to_string(),
                        branch: git::current_branch(&current).unwrap_or_default(),
                    };
                    profiles.insert(name.to_string(), profile);
                    if let Err(e) = store::save_profiles(&profiles_path, &profiles) {
                        eprintln!("{}: {}", "Error".red().bold(), e);
                    } else {
                        println!("Profile saved: {}", name);
                    }
                }
                Some("load") => {
                    let Some(profile) = parts.get(2).and_then(|name| profiles.get(*name)) else {
                        eprintln!("Profile not found (see 'profile list')");
                        continue;
                    };
                    let path = PathBuf::from(&profile.path);
                    if git::is_git_repo(&path) {
                        println!(
                            "Selected repo: {} ({} / {})",
                            path.display(),
                            profile.remote,
                            profile.branch
                        );
                        repo = Some(path);
                    } else {
                        eprintln!("{}: profile path is not a git repository", "Error".red().bold());
                    }
                }
                Some("delete") => {
                    let Some(name) = parts.get(2) else {
                        eprintln!("Usage: profile delete <name>");
                        continue;
                    };
                    if profiles.remove(*name).is_none() {
                        eprintln!("Profile not found: {}", name);
                        continue;
                    }
                    if let Err(e) = store::save_profiles(&profiles_path, &profiles) {
                        eprintln!("{}: {}", "Error".red().bold(), e);
                    } else {
                        println!("Profile deleted: {}", name);
                    }
                }
                Some(other) => eprintln!("Unknown profile command: {}", other),
            },
            "set-key" => {
                let api_key = prompt_line("Enter OpenRouter API key: ")?;
                if api_key.is_empty() {
                    continue;
                }
                let password = prompt_line("Password to encrypt the key: ")?;
                if password.is_empty() {
                    continue;
                }
                match vault::encrypt(&api_key, &password) {
                    Ok(payload) => {
                        if let Err(e) = store::save_secret(&credential_path, &payload) {
                            eprintln!("{}: {}", "Error".red().bold(), e);
                            continue;
                        }
                        session.unlock_with(api_key);
                        println!("API key saved and unlocked for this session.");
                    }
                    Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
                }
            }
            "unlock" => {
                let Some(payload) = store::load_secret(&credential_path) else {
                    println!("No API key saved yet. Use 'set-key' first.");
                    continue;
                };
                let password = prompt_line("Enter password: ")?;
                match vault::decrypt(&payload, &password) {
                    Ok(api_key) => {
                        session.unlock_with(api_key);
                        println!("API key unlocked for this session.");
                    }
                    Err(VaultError::InvalidCredential) => {
                        eprintln!("{}: wrong password, try again", "Error".red().bold());
                    }
                    Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
                }
            }
            "lock" => {
                session.lock();
                println!("Session locked.");
            }
            "auth" => {
                let name = git::read_git_config("user.name");
                let email = git::read_git_config("user.email");
                let helper = git::read_git_config("credential.helper");
                let keys = git::ssh_key_status();

                println!("Auth check:");
                println!("- user.name: {}", if name.is_empty() { "missing" } else { name.as_str() });
                println!("- user.email: {}", if email.is_empty() { "missing" } else { email.as_str() });
                println!(
                    "- credential.helper: {}",
                    if helper.is_empty() { "not set" } else { helper.as_str() }
                );
                if keys.is_empty() {
                    println!("- ssh keys: none found (~/.ssh/id_ed25519 or id_rsa)");
                } else {
                    let listed: Vec<String> =
                        keys.iter().map(|p| p.display().to_string()).collect();
                    println!("- ssh keys: {}", listed.join(", "));
                }
            }
            "suggest" => {
                let Some(current) = require_repo(&repo) else {
                    continue;
                };
                let Some(api_key) = session.api_key() else {
                    eprintln!("Unlock or set the API key first ('unlock' / 'set-key').");
                    continue;
                };
                println!("Generating commit message...");
                let context_repo = current.clone();
                let context =
                    tokio::task::spawn_blocking(move || git::collect_commit_context(&context_repo))
                        .await?;
                match ai::request_completion(
                    api_key,
                    &config.ai.model,
                    &context,
                    config.ai.api_url.as_deref(),
                )
                .await
                {
                    Ok(message) => {
                        println!("{}", "Suggested commit message:".green().bold());
                        println!("{}", message);
                        println!("(use: commit {})", message);
                    }
                    Err(e) => report_ai_error(&e),
                }
            }
            "test" => {
                let Some(api_key) = session.api_key() else {
                    eprintln!("Unlock or set the API key first ('unlock' / 'set-key').");
                    continue;
                };
                match ai::request_completion(
                    api_key,
                    &config.ai.model,
                    "Reply with the word OK.",
                    config.ai.api_url.as_deref(),
                )
                .await
                {
                    Ok(reply) => println!("Test response: {}", reply),
                    Err(e) => report_ai_error(&e),
                }
            }
            other => eprintln!("Unknown command: {} (try 'help')", other),
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  repo <path>                 select a repository");
    println!("  status | log | diff         inspect the repository");
    println!("  stage                       git add -A");
    println!("  commit <message>            commit with a message");
    println!("  clone <url> <dest-dir>      clone a repository");
    println!("  fav [list|add|rm|load]      manage favorite repositories");
    println!("  profile [list|save|load|delete]  manage saved profiles");
    println!("  set-key | unlock | lock     manage the encrypted API key");
    println!("  suggest                     suggest a commit message via AI");
    println!("  test                        ping the completion API");
    println!("  auth                        check git identity and ssh keys");
    println!("  exit                        quit");
}

fn require_repo(repo: &Option<PathBuf>) -> Option<PathBuf> {
    match repo {
        Some(path) => Some(path.clone()),
        None => {
            eprintln!("Select a repository first ('repo <path>').");
            None
        }
    }
}

/// Run one git command off the interactive loop and print its output.
async fn run_in_repo(repo: &Option<PathBuf>, args: &[&str]) {
    let Some(current) = require_repo(repo) else {
        return;
    };
    let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let result = tokio::task::spawn_blocking(move || {
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        git::run_git(&refs, &current)
    })
    .await;
    match result {
        Ok(out) => print_git_output(&out),
        Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
    }
}

fn print_git_output(out: &git::GitOutput) {
    if !out.stdout.is_empty() {
        println!("{}", out.stdout);
    }
    if !out.stderr.is_empty() {
        eprintln!("{}", out.stderr);
    }
    if !out.success() {
        eprintln!("{}: exit code {}", "Error".red().bold(), out.code);
    }
}

fn report_ai_error(err: &AiError) {
    match err {
        AiError::AuthenticationError(_) => {
            eprintln!("{}: {} - re-check your saved API key", "Error".red().bold(), err);
        }
        AiError::NetworkError(_) => {
            eprintln!("{}: {} - check your connection and retry", "Error".red().bold(), err);
        }
        _ => eprintln!("{}: {}", "Error".red().bold(), err),
    }
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}
