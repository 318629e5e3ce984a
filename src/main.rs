use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::info;

use csfs::{Config, Errno, Filesystem, PermissionMode};

/// Run one operation against a csfs image
#[derive(Debug, Parser)]
#[clap(name = "csfs", version)]
struct Cli {
  /// YAML settings file
  #[clap(short, long)]
  config: Option<PathBuf>,

  /// Backing file, overrides the config
  #[clap(short, long)]
  image: Option<PathBuf>,

  #[clap(short, long, default_value = "admin")]
  user: String,

  #[clap(short, long)]
  password: Option<String>,

  /// Directory to start in
  #[clap(long)]
  cwd: Option<String>,

  #[clap(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Format the image
  Mkfs,
  /// Show space and inode usage
  Df,
  Ls {
    #[clap(short)]
    long: bool,
    pathname: Option<String>,
  },
  Mkdir {
    #[clap(required = true)]
    pathnames: Vec<String>,
  },
  Touch {
    #[clap(required = true)]
    pathnames: Vec<String>,
  },
  Rm {
    #[clap(short)]
    recursive: bool,
    pathname: String,
  },
  Mv {
    source: String,
    destination: String,
  },
  Cp {
    source: String,
    destination: String,
  },
  /// Import a host file into the current directory
  Put {
    host_file: PathBuf,
  },
  /// Export a file into the configured export directory
  Get {
    pathname: String,
  },
  Cat {
    #[clap(required = true)]
    pathnames: Vec<String>,
  },
  /// CODE is 00, 10 or 11 (read bit, write bit)
  Chmod {
    code: String,
    pathname: String,
    #[clap(required = true)]
    users: Vec<u8>,
  },
  Users,
  Useradd {
    name: String,
    password: String,
  },
  Userdel {
    name: String,
  },
}

fn session(fs: &mut Filesystem, command: &Command, config: &Config) -> Result<(), Errno> {
  match command {
    Command::Mkfs => return Err(Errno::InvalidArgument("csfs: mkfs does not take a mounted image")),
    Command::Df => println!("{}", fs.usage()),
    Command::Ls { long: true, pathname } => {
      for entry in fs.list_directory_detailed(pathname.as_deref())? {
        println!("{entry}");
      }
    }
    Command::Ls { long: false, pathname } => {
      println!("{}", fs.list_directory(pathname.as_deref())?.iter().join("  "));
    }
    Command::Mkdir { pathnames } => {
      fs.create_directories(&pathnames.iter().map(String::as_str).collect::<Vec<&str>>())?;
    }
    Command::Touch { pathnames } => {
      fs.create_files(&pathnames.iter().map(String::as_str).collect::<Vec<&str>>())?;
    }
    Command::Rm { recursive: true, pathname } => fs.remove_recursive(pathname)?,
    Command::Rm { recursive: false, pathname } => fs.remove(pathname)?,
    Command::Mv { source, destination } => fs.move_entry(source, destination)?,
    Command::Cp { source, destination } => {
      fs.copy(source, destination)?;
    }
    Command::Put { host_file } => {
      fs.import_file(host_file)?;
    }
    Command::Get { pathname } => {
      println!("{}", fs.export_file(pathname, &config.export_dir)?.display());
    }
    Command::Cat { pathnames } => {
      let contents = fs.read_files(&pathnames.iter().map(String::as_str).collect::<Vec<&str>>())?;
      for content in contents {
        print!("{}", String::from_utf8_lossy(&content));
      }
    }
    Command::Chmod { code, pathname, users } => {
      fs.change_permission(pathname, code.parse::<PermissionMode>()?, users)?;
    }
    Command::Users => {
      for (index, name) in fs.list_users() {
        println!("{index} {name}");
      }
    }
    Command::Useradd { name, password } => {
      println!("{}", fs.add_user(name, password)?);
    }
    Command::Userdel { name } => {
      fs.delete_user(name)?;
    }
  }

  Ok(())
}

fn run(cli: &Cli, config: &Config, image: &Path) -> Result<(), Errno> {
  if let Command::Mkfs = cli.command {
    Filesystem::mkfs(image)?;
    println!("formatted {}", image.display());
    return Ok(());
  }

  let mut fs = Filesystem::mount(image)?;

  let password = cli.password
    .as_deref()
    .ok_or(Errno::PermissionDenied("csfs: --password is required"))?;
  let user = fs.authenticate(&cli.user, password)?;
  fs.set_current_user(user)?;
  info!("csfs: logged in as '{}'", cli.user);

  if let Some(cwd) = &cli.cwd {
    fs.change_directory(cwd)?;
  }

  session(&mut fs, &cli.command, config)
}

pub fn main() -> ExitCode {
  let cli = Cli::parse();

  let config = match &cli.config {
    Some(config_path) => match Config::load(config_path) {
      Ok(config) => config,
      Err(errno) => {
        eprintln!("csfs: {}: {errno}", config_path.display());
        return ExitCode::FAILURE;
      }
    },
    None => Config::default(),
  };

  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter)).init();

  let image = cli.image.clone().unwrap_or_else(|| config.image.clone());

  match run(&cli, &config, &image) {
    Ok(()) => ExitCode::SUCCESS,
    Err(errno) => {
      eprintln!("csfs: {errno}");
      ExitCode::FAILURE
    }
  }
}

// vim:ts=2 sw=2
