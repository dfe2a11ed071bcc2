use std::path::PathBuf;
use structopt::{clap::AppSettings::ColoredHelp, StructOpt};

#[derive(StructOpt, Debug)]
#[structopt(name = "wikivoyage-data", setting(ColoredHelp))]
pub struct Args {
    /// print every accepted article
    #[structopt(long, short)]
    pub verbose: bool,
    /// language edition of the dump (en, it, fr, he, fa, ...)
    #[structopt(long, short, default_value = "en")]
    pub lang: String,
    /// working folder holding the dump and receiving the database
    #[structopt(long, short, default_value = ".")]
    pub folder: PathBuf,
    /// path to the dump [default: <folder>/<lang>wikivoyage-latest-pages-articles.xml.bz2]
    #[structopt(long, short)]
    pub input: Option<PathBuf>,
    /// path to the output database [default: <folder>/wikivoyage.sqlite]
    #[structopt(long, short)]
    pub output: Option<PathBuf>,
    /// store article text and GPX as plain text instead of bzip2 blobs
    #[structopt(long)]
    pub uncompressed: bool,
    /// sqlite file caching wikidata metadata; listings skip wikidata
    /// resolution when absent
    #[structopt(long)]
    pub wikidata_cache: Option<PathBuf>,
    /// number of pages to process [default: unlimited]
    #[structopt(long, short)]
    pub pages: Option<usize>,
}

impl Args {
    pub fn dump_file(&self) -> PathBuf {
        self.input.clone().unwrap_or_else(|| {
            self.folder.join(format!(
                "{}wikivoyage-latest-pages-articles.xml.bz2",
                self.lang
            ))
        })
    }

    pub fn database_file(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.folder.join("wikivoyage.sqlite"))
    }
}

pub fn get_opts() -> Args {
    Args::from_args()
}
