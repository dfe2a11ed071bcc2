use std::fs::File;
use std::io::{BufReader, Read};
use std::time::{Duration, Instant};

use bzip2::read::BzDecoder;
use geo_coords::lat_lon_from_geo_block;
use macro_scanner::scan_with;
use template_classifier::TemplateKind;
use wikidata_lookup::{MetadataSource, WikidataClient};

mod args;
mod db;
mod error;

use args::Args;
use db::{ArticleRecord, ArticleWriter};
use error::{Error, Result};

fn print_time(time: &Duration) -> String {
    let secs = time.as_secs();
    if secs >= 60 {
        format!("{}m {}.{:03}s", secs / 60, secs % 60, time.subsec_millis())
    } else {
        format!("{}.{:03}s", secs, time.subsec_millis())
    }
}

fn open_dump(args: &Args) -> Result<Box<dyn Read>> {
    let path = args.dump_file();
    let file = File::open(&path).map_err(|e| Error::Io {
        action: "open",
        path: path.clone(),
        cause: e,
    })?;
    if path.extension().map_or(false, |ext| ext == "bz2") {
        Ok(Box::new(BzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn try_main() -> Result<()> {
    let main_start = Instant::now();
    let args = args::get_opts();
    let dump = open_dump(&args)?;
    let mut wikidata = match &args.wikidata_cache {
        Some(path) => Some(WikidataClient::open(path)?),
        None => None,
    };
    let mut writer = ArticleWriter::create(args.database_file(), &args.lang, args.uncompressed)?;
    let page_limit = args.pages.unwrap_or(std::usize::MAX);
    let mut accepted = 0u64;
    let start_time = main_start.elapsed();
    let parse_start = Instant::now();
    for page in dump_reader::parse(BufReader::new(dump)).take(page_limit) {
        let page = page?;
        if page.namespace != 0 {
            continue;
        }
        let metadata = wikidata
            .as_mut()
            .map(|client| client as &mut dyn MetadataSource);
        let output = scan_with(&page.text, &args.lang, metadata);
        if output.blocks.is_empty() {
            continue;
        }
        let lat_lon = lat_lon_from_geo_block(output.blocks.get(TemplateKind::Location));
        if lat_lon.is_zero() {
            continue;
        }
        let image_title = article_builder::banner_filename(output.blocks.get(TemplateKind::Banner));
        let is_part_of = article_builder::part_of(output.blocks.get(TemplateKind::PartOf));
        let points = article_builder::waypoints(output.blocks.get(TemplateKind::PointOfInterest));
        accepted += 1;
        if args.verbose {
            eprintln!("accepted [[{}]] {}", page.title, lat_lon);
        } else if accepted % 500 == 0 {
            eprintln!("{} articles accepted, at [[{}]]", accepted, page.title);
        }
        writer.insert(&ArticleRecord {
            id: page.id,
            article_id: urlencoding::encode(&page.title).into_owned(),
            title: &page.title,
            content: &output.text,
            is_part_of: urlencoding::encode(&is_part_of).into_owned(),
            lat: lat_lon.latitude(),
            lon: lat_lon.longitude(),
            image_title,
            gpx: article_builder::gpx(&points),
        })?;
    }
    writer.finish()?;
    eprintln!(
        "accepted {} articles; startup took {}, parsing {}",
        accepted,
        print_time(&start_time),
        print_time(&parse_start.elapsed())
    );
    Ok(())
}

fn main() {
    try_main().unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
}
