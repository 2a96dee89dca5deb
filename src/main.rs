use std::io::{BufWriter, Write};

use anyhow::{anyhow, Result};
use argh::FromArgs;
use flexi_logger::Logger;

use gfa::{gfa::GFA, parser::GFAParser};

use log::info;

use cactus_bubbles::{
    cactus_bubbles_with, superbubbles, BidirectedGraph, BubbleMap, Config,
    SideGraph,
};

#[derive(Debug, FromArgs)]
/// Find the bubbles in a GFA graph with numeric segment names.
struct Args {
    /// the GFA file to load
    #[argh(positional)]
    gfa_path: String,

    /// use the superbubble detector; the graph must be acyclic
    #[argh(switch)]
    superbubbles: bool,

    /// node to use as the source, instead of the lowest head node
    #[argh(option)]
    source: Option<u64>,

    /// node to use as the sink, instead of the highest tail node
    #[argh(option)]
    sink: Option<u64>,
}

fn print_bubbles(bubbles: &BubbleMap) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for (&(from, to), contents) in bubbles.iter() {
        let contents = contents
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{}\t{}\t{}", from, to, contents)?;
    }

    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let _logger = Logger::try_with_env_or_str("info")?.start()?;

    let parser: GFAParser<usize, ()> = GFAParser::new();
    let gfa: GFA<usize, ()> = parser
        .parse_file(&args.gfa_path)
        .map_err(|e| {
            anyhow!("could not parse GFA {}: {:?}", args.gfa_path, e)
        })?;

    let graph = BidirectedGraph::from_gfa(&gfa);
    info!(
        "Loaded graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    let bubbles = if args.superbubbles {
        superbubbles(&graph)?
    } else {
        let mut config = Config::new();
        if let Some(source) = args.source {
            config = config.with_source(source);
        }
        if let Some(sink) = args.sink {
            config = config.with_sink(sink);
        }
        cactus_bubbles_with(&graph, &config)?
    };

    info!("Found {} bubbles", bubbles.len());

    print_bubbles(&bubbles)
}
