extern crate clap;
use chrono::Local;
use clap::{App, Arg};
use log::LevelFilter;
use log::{debug, error, info, trace};
use simple_logger::SimpleLogger;
use std::fs::File;
use std::io::prelude::*;
use std::io::{Error, ErrorKind};
use std::path::Path;
use std::process::exit;
use std::vec::Vec;
use walkdir::WalkDir;

pub use message::*;
pub mod message;

use indicators::*;
pub mod indicators;

fn main() -> std::io::Result<()> {
    let matches = App::new("Tiny Email Triage")
        .version("0.0.1")
        .about("Scans all email files in a folder and extracts their authentication and routing indicators")
        .arg(
            Arg::with_name("INPUTDIR")
                .short("i")
                .long("inputDir")
                .value_name("INPUTDIR")
                .help("Sets the directory containing the email files")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("OUTPUTFILE")
                .short("f")
                .long("outputFile")
                .help("Sets the output file to write to")
                .required(false)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("FORMAT")
                .short("o")
                .long("outputFormat")
                .help("Sets the output file format")
                .required(false)
                .takes_value(true)
                .possible_values(&["html", "txt", "json"])
                .default_value("txt"),
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity (-vvv is trace)"),
        )
        .get_matches();

    let input_dir = matches.value_of("INPUTDIR").unwrap();
    let mut output_file = "";
    if let Some(output_file_match) = matches.value_of("OUTPUTFILE") {
        output_file = output_file_match;
    }
    let output_format = matches.value_of("FORMAT").unwrap();
    let verbose_level = matches.occurrences_of("v");

    let log_level;
    match verbose_level {
        0 => {
            log_level = LevelFilter::Warn;
        }
        1 => {
            log_level = LevelFilter::Info;
        }
        2 => {
            log_level = LevelFilter::Debug;
        }
        3 => {
            log_level = LevelFilter::Trace;
        }
        _ => {
            log_level = LevelFilter::Trace;
        }
    }

    match SimpleLogger::new().with_level(log_level).init() {
        Ok(()) => {}
        Err(e) => println!("Failed to initialise logger: {:?}", e),
    }

    let all_results;
    match read_email_files(input_dir) {
        Ok(all_results_read) => {
            all_results = all_results_read;
            info!("Processed {:?} files", all_results.len());
        }
        Err(e) => {
            error!("Something went wrong: {:?}", e);
            exit(1);
        }
    };

    let report = generate_report(all_results, output_format);
    output_report(report, output_file);

    Ok(())
}

/**
 * Walk the input directory and extract the indicators from each email file
 * found. A file that cannot be read or parsed is logged and skipped, the
 * rest of the batch still runs.
 */
fn read_email_files(input_dir: &str) -> std::io::Result<Vec<ResultEntry>> {
    let input_path = Path::new(input_dir);
    let mut all_results: Vec<ResultEntry> = Vec::new();

    if !input_path.is_dir() {
        return Err(Error::new(
            ErrorKind::Other,
            format!("{:?} is not a directory", input_dir),
        ));
    }

    for dir_entry in WalkDir::new(input_path) {
        let dir_entry = match dir_entry {
            Ok(dir_entry_read) => dir_entry_read,
            Err(e) => {
                error!("Failed to read directory entry: {}", e);
                continue;
            }
        };
        if dir_entry.path().is_dir() {
            continue;
        }

        let file_name = dir_entry.file_name().to_string_lossy().to_string();
        if !file_name.ends_with(".eml") && !file_name.ends_with(".msg") {
            trace!("skipping file {:?}", file_name);
            continue;
        }

        debug!("Reading file: {:?}", dir_entry.file_name());
        let mut contents = String::new();
        let mut file;
        match File::open(dir_entry.path()) {
            Ok(file_read) => file = file_read,
            Err(e) => {
                error!("Error reading {:?}: {}", dir_entry.path(), e);
                continue;
            }
        }
        match file.read_to_string(&mut contents) {
            Ok(_) => {}
            Err(e) => {
                error!("Error reading {:?}: {}", dir_entry.path(), e);
                continue;
            }
        }

        match parse_headers(&contents) {
            Ok(headers) => {
                trace!("made a header map with {:?} entries", headers.len());
                all_results.push(ResultEntry {
                    file_name: file_name,
                    indicators: extract_indicators(&headers),
                });
            }
            Err(e) => {
                error!("Error parsing {:?}: {}", dir_entry.path(), e);
            }
        }
    }

    Ok(all_results)
}

/**
 * Generate a report as a String of the requested format
 */
fn generate_report(all_results: Vec<ResultEntry>, output_format: &str) -> String {
    match output_format {
        "html" => generate_html_report(all_results),
        "txt" => generate_txt_report(all_results),
        "json" => generate_json_report(all_results),
        _ => String::from("not sure how this could ever be hit"),
    }
}

/**
 * Output the report, either to stdout or the requested file
 */
fn output_report(report: String, output_file: &str) {
    if output_file.len() == 0 {
        println!("{}", report);
    } else {
        let path = Path::new(output_file);
        let display = path.display();
        println!("Writing to file {:?}", display);

        let mut file = match File::create(&path) {
            Err(why) => panic!("couldn't create {}: {}", display, why),
            Ok(file) => file,
        };

        match file.write_all(report.as_bytes()) {
            Err(why) => panic!("couldn't write to {}: {}", display, why),
            Ok(_) => println!("successfully wrote to {}", display),
        }
    }
}

/**
 * Generate a text based report
 */
fn generate_txt_report(all_results: Vec<ResultEntry>) -> String {
    info!("Generating text report");
    let mut report = String::from(format!(
        "EMAIL INDICATOR REPORT GENERATED AT {}\n===\n",
        Local::now().format("%+").to_string()
    ));

    for entry in all_results.iter() {
        report += &String::from(format!("File: {}\n", entry.file_name));
        report += &String::from(format!("SPF: {}\n", entry.indicators.spf));
        report += &String::from(format!("DKIM: {}\n", entry.indicators.dkim));
        report += &String::from(format!("DMARC: {}\n", entry.indicators.dmarc));
        report += &String::from(format!("Source IP: {}\n", entry.indicators.source_ip));
        report += &String::from(format!(
            "Destination Email: {}\n",
            entry.indicators.destination
        ));
        report += &String::from(format!("---\n"));
    }

    report
}

/**
 * Generate a HTML report
 */
fn generate_html_report(all_results: Vec<ResultEntry>) -> String {
    info!("Generating html report");

    let mut report = String::from("<!DOCTYPE html>\n");
    report += &String::from("<html lang=\"en\">\n");
    report += &String::from("  <head>\n");
    report += &String::from("    <meta charset=\"utf-8\">\n");
    report += &String::from("    <title>Email Indicator Report</title>\n");
    report += &String::from("    <style>\n");
    report += &String::from("      html {font-family: Arial, Helvetica, sans-serif;}\n");
    report += &String::from(
        "      th {background-color: #77b7c6; color: #ffffff; padding: 6px 3px 6px 3px;}\n",
    );
    report +=
        &String::from("      td {background-color: #eeeeee; padding: 5px; vertical-align: top;}\n");
    report += &String::from("      td.file {text-align: right; background-color: #ebfbff;}\n");
    report += &String::from("      td.missing {background-color: #f9e0e0;}\n");
    report += &String::from("    </style>\n");
    report += &String::from("  </head>\n");
    report += &String::from("  <body>\n");
    report += &String::from("    <h1>Email Indicator Report</h1>\n");
    report += &String::from(format!(
        "    <p>Report generated at {}</p>\n",
        Local::now().format("%+").to_string()
    ));
    report += &String::from("    <table>\n");
    report += &String::from("      <tr>\n");
    report += &String::from("        <th>File</th>\n");
    report += &String::from("        <th>SPF</th>\n");
    report += &String::from("        <th>DKIM</th>\n");
    report += &String::from("        <th>DMARC</th>\n");
    report += &String::from("        <th>Source IP</th>\n");
    report += &String::from("        <th>Destination Email</th>\n");
    report += &String::from("      </tr>\n");

    for entry in all_results.iter() {
        report += &String::from("      <tr>\n");
        report += &String::from(format!(
            "        <td class=\"file\">{}</td>\n",
            entry.file_name
        ));
        report += &html_cell(&entry.indicators.spf);
        report += &html_cell(&entry.indicators.dkim);
        report += &html_cell(&entry.indicators.dmarc);
        report += &html_cell(&entry.indicators.source_ip);
        report += &html_cell(&entry.indicators.destination);
        report += &String::from("      </tr>\n");
    }

    report += &String::from("    </table>\n");
    report += &String::from("  </body>\n");
    report += &String::from("</html>\n");

    report
}

/**
 * Render one indicator table cell, highlighting values that were not found
 */
fn html_cell(value: &str) -> String {
    if value == "Not Found" {
        String::from(format!("        <td class=\"missing\">{}</td>\n", value))
    } else {
        String::from(format!("        <td>{}</td>\n", value))
    }
}

/**
 * Generate a JSON object of the report
 */
fn generate_json_report(all_results: Vec<ResultEntry>) -> String {
    info!("Generating json report");
    let mut report = String::from(format!(
        "{{\"report-time\":\"{}\",\"report\":[",
        Local::now().format("%+").to_string()
    ));

    let mut first_file_record = true;
    for entry in all_results.iter() {
        if first_file_record {
            first_file_record = false;
        } else {
            report += &String::from(",")
        }
        report += &String::from(format!(
            "{{\"file\":\"{}\",\"spf\":\"{}\",\"dkim\":\"{}\",\"dmarc\":\"{}\",\"source-ip\":\"{}\",\"destination-email\":\"{}\"}}",
            json_escape(&entry.file_name),
            json_escape(&entry.indicators.spf),
            json_escape(&entry.indicators.dkim),
            json_escape(&entry.indicators.dmarc),
            json_escape(&entry.indicators.source_ip),
            json_escape(&entry.indicators.destination)
        ));
    }

    report += &String::from("]}");

    report
}

/**
 * Header values are free text, quotes and backslashes in them have to be
 * escaped before they can sit inside a JSON string
 */
fn json_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
