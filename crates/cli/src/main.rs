use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hullquery::{Hull, HullBuilder, HullOptions, OptionMap, Resolution};
use nalgebra::DVector;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod points;
mod provenance;

use points::read_points;
use provenance::{write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "hullq")]
#[command(about = "Convex hull construction and queries over CSV point tables")]
struct Cmd {
    /// Hull option as key=value; repeatable (e.g. --opt expand-hulls-exactly=no)
    #[arg(long = "opt", value_parser = parse_option, global = true)]
    opts: Vec<(String, String)>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Build a hull and write its vertices and facets
    Hull {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Membership and distances for every row of a query table
    Query {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        points: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Also report the grid estimate of the boundary distance
        #[arg(long)]
        grid: Option<usize>,
    },
    /// Push every facet outward by a margin
    Expand {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        margin: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Maximize the product of coordinates over the hull
    MaxProd {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Use the grid estimator at `hull-mcp-resolution` instead of the exact search
        #[arg(long)]
        estimate: bool,
    },
    /// Print a small provenance JSON block
    Report,
}

fn parse_option(raw: &str) -> Result<(String, String), String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty option".to_string());
    }
    Ok(match raw.split_once('=') {
        Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
        None => (raw.to_string(), String::new()),
    })
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    let options: OptionMap = cmd.opts.into_iter().collect();
    match cmd.action {
        Action::Hull { input, out } => hull(&input, &out, &options),
        Action::Query {
            input,
            points,
            out,
            grid,
        } => query(&input, &points, &out, grid, &options),
        Action::Expand { input, margin, out } => expand(&input, margin, &out, &options),
        Action::MaxProd {
            input,
            out,
            estimate,
        } => max_prod(&input, &out, estimate, &options),
        Action::Report => report(&options),
    }
}

#[derive(Serialize)]
struct FacetDoc {
    normal: Vec<f64>,
    offset: f64,
    vertices: Vec<usize>,
}

#[derive(Serialize)]
struct HullDoc {
    dim: usize,
    vertices: Vec<Vec<f64>>,
    facets: Vec<FacetDoc>,
    centroid: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl HullDoc {
    fn of(hull: &Hull) -> Self {
        let (lo, hi) = hull.bounds();
        Self {
            dim: hull.dim(),
            vertices: hull.vertex_table(),
            facets: hull
                .facets()
                .iter()
                .enumerate()
                .map(|(i, h)| FacetDoc {
                    normal: h.n.iter().copied().collect(),
                    offset: h.c,
                    vertices: hull.facet_vertices(i).to_vec(),
                })
                .collect(),
            centroid: hull.centroid().iter().copied().collect(),
            lower: lo.iter().copied().collect(),
            upper: hi.iter().copied().collect(),
        }
    }
}

#[derive(Serialize)]
struct QueryDoc {
    point: Vec<f64>,
    inside: bool,
    interior_distance: f64,
    boundary_distance: f64,
    signed_distance: f64,
    nearest_boundary_point: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grid_distance: Option<f64>,
}

#[derive(Serialize)]
struct ProductDoc {
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<usize>,
    point: Vec<f64>,
    value: f64,
}

fn load_hull(input: &Path, options: &OptionMap) -> Result<(Hull, HullBuilder)> {
    let pts = read_points(input)?;
    let builder = HullBuilder::new(HullOptions::from_map(options)?);
    let hull = builder
        .build(&pts)
        .with_context(|| format!("building hull from {}", input.display()))?;
    tracing::info!(
        input = %input.display(),
        points = pts.len(),
        dim = hull.dim(),
        vertices = hull.vertices().len(),
        facets = hull.facets().len(),
        "hull_built"
    );
    Ok((hull, builder))
}

fn write_json<T: Serialize>(out: &Path, value: &T) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", out.display()))
}

fn to_vec(p: &DVector<f64>) -> Vec<f64> {
    p.iter().copied().collect()
}

fn hull(input: &Path, out: &Path, options: &OptionMap) -> Result<()> {
    let (hull, _) = load_hull(input, options)?;
    write_json(out, &HullDoc::of(&hull))?;
    let params = serde_json::json!({ "input": input.to_string_lossy() });
    let sidecar = write_sidecar(out, Payload::new("hull", params, options))?;
    tracing::info!(out = %out.display(), provenance = %sidecar.display(), "wrote");
    Ok(())
}

fn query(
    input: &Path,
    points: &Path,
    out: &Path,
    grid: Option<usize>,
    options: &OptionMap,
) -> Result<()> {
    let (hull, _) = load_hull(input, options)?;
    let resolution = grid.map(Resolution::new).transpose()?;
    let queries = read_points(points)?;
    let mut docs = Vec::with_capacity(queries.len());
    for (row, p) in queries.iter().enumerate() {
        if p.len() != hull.dim() {
            bail!(
                "query row {row} has dimension {}, hull has {}",
                p.len(),
                hull.dim()
            );
        }
        docs.push(QueryDoc {
            point: to_vec(p),
            inside: hull.is_inside(p),
            interior_distance: hull.interior_distance(p),
            boundary_distance: hull.boundary_distance(p),
            signed_distance: hull.signed_distance(p),
            nearest_boundary_point: to_vec(&hull.nearest_boundary_point(p)),
            grid_distance: resolution.map(|r| hull.estimate_boundary_distance(p, r).distance),
        });
    }
    let inside = docs.iter().filter(|d| d.inside).count();
    tracing::info!(queries = docs.len(), inside, "queried");
    write_json(out, &docs)?;
    let params = serde_json::json!({
        "input": input.to_string_lossy(),
        "points": points.to_string_lossy(),
        "grid": grid,
    });
    write_sidecar(out, Payload::new("query", params, options))?;
    Ok(())
}

fn expand(input: &Path, margin: f64, out: &Path, options: &OptionMap) -> Result<()> {
    let (hull, builder) = load_hull(input, options)?;
    let mode = builder.options().expansion;
    let big = builder
        .expand(&hull, margin)
        .with_context(|| format!("expanding by {margin}"))?;
    tracing::info!(
        margin,
        exact = mode.is_exact(),
        vertices = big.vertices().len(),
        facets = big.facets().len(),
        "expanded"
    );
    write_json(out, &HullDoc::of(&big))?;
    let params = serde_json::json!({
        "input": input.to_string_lossy(),
        "margin": margin,
        "exact": mode.is_exact(),
    });
    write_sidecar(out, Payload::new("expand", params, options))?;
    Ok(())
}

fn max_prod(input: &Path, out: &Path, estimate: bool, options: &OptionMap) -> Result<()> {
    let (hull, builder) = load_hull(input, options)?;
    let doc = if estimate {
        let res = builder.options().mcp_resolution;
        let best = hull.estimate_max_coord_product(res)?;
        ProductDoc {
            mode: "estimate",
            resolution: Some(res.get()),
            point: to_vec(&best.point),
            value: best.value,
        }
    } else {
        let best = hull.max_coord_product()?;
        ProductDoc {
            mode: "exact",
            resolution: None,
            point: to_vec(&best.point),
            value: best.value,
        }
    };
    tracing::info!(mode = doc.mode, value = doc.value, "max_coord_product");
    write_json(out, &doc)?;
    let params = serde_json::json!({
        "input": input.to_string_lossy(),
        "estimate": estimate,
    });
    write_sidecar(out, Payload::new("max-prod", params, options))?;
    Ok(())
}

fn report(options: &OptionMap) -> Result<()> {
    let parsed = HullOptions::from_map(options)?;
    let info = serde_json::json!({
        "code_rev": provenance::current_git_rev(),
        "hullquery_version": hullquery::VERSION,
        "options": {
            "tolerance": parsed.tolerance,
            "recompute_hulls": parsed.recompute_hulls,
            "exact_expansion": parsed.expansion.is_exact(),
            "mcp_resolution": parsed.mcp_resolution.get(),
            "degeneracy": format!("{:?}", parsed.degeneracy),
            "forwarded": parsed.extra,
        },
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
