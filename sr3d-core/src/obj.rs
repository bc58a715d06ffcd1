/// Wavefront OBJ parser
use std::collections::HashMap;

use nalgebra::{Point3, Vector2, Vector3};
use nom::{
    character::complete::{char, i64 as integer, space0, space1},
    combinator::{all_consuming, opt},
    multi::many1,
    number::complete::float,
    sequence::{pair, preceded, terminated},
    IResult,
};

use crate::error::{Error, Result};
use crate::geometry::{Mesh, Vertex};

/// One `f` corner: raw 1-based (or negative, relative) indices
#[derive(Debug, Clone, Copy, PartialEq)]
struct Corner {
    position: i64,
    uv: Option<i64>,
    normal: Option<i64>,
}

/// Parse OBJ source text into a mesh.
///
/// Supports `v`, `vt`, `vn` and `f` statements; everything else is skipped.
/// Polygons are fan-triangulated. Vertices without a normal get a smoothed one
/// computed from the surrounding faces; vertices without a texture coordinate
/// get (0, 0).
pub fn parse_obj(input: &str) -> Result<Mesh> {
    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut uvs: Vec<Vector2<f32>> = Vec::new();
    let mut normals: Vec<Vector3<f32>> = Vec::new();

    let mut mesh = Mesh::new();
    let mut missing_normal: Vec<bool> = Vec::new();
    // (position, uv, normal) -> mesh vertex index
    let mut vertex_cache: HashMap<(usize, Option<usize>, Option<usize>), usize> = HashMap::new();

    for (line_idx, line) in input.lines().enumerate() {
        let line_num = line_idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (keyword, rest) = line
            .split_once(|c: char| c.is_whitespace())
            .unwrap_or((line, ""));

        match keyword {
            "v" => {
                let (x, y, z) = run(line_num, vec3(rest))?;
                positions.push(Point3::new(x, y, z));
            }
            "vt" => {
                let (u, v) = run(line_num, vec2(rest))?;
                uvs.push(Vector2::new(u, v));
            }
            "vn" => {
                let (x, y, z) = run(line_num, vec3(rest))?;
                normals.push(Vector3::new(x, y, z));
            }
            "f" => {
                let corners = run(line_num, face(rest))?;
                if corners.len() < 3 {
                    return Err(Error::parse(line_num, "face needs at least 3 vertices"));
                }

                let mut indices = Vec::with_capacity(corners.len());
                for corner in corners {
                    let key = (
                        resolve(line_num, corner.position, positions.len())?,
                        corner.uv.map(|i| resolve(line_num, i, uvs.len())).transpose()?,
                        corner.normal.map(|i| resolve(line_num, i, normals.len())).transpose()?,
                    );
                    let index = *vertex_cache.entry(key).or_insert_with(|| {
                        let (p, t, n) = key;
                        missing_normal.push(n.is_none());
                        mesh.add_vertex(Vertex::new(
                            positions[p],
                            n.map_or_else(Vector3::zeros, |n| normals[n]),
                            t.map_or_else(Vector2::zeros, |t| uvs[t]),
                        ))
                    });
                    indices.push(index);
                }

                for i in 1..indices.len() - 1 {
                    mesh.add_face([indices[0], indices[i], indices[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if missing_normal.iter().any(|&m| m) {
        log::debug!("obj has vertices without normals, smoothing");
        mesh.smooth_normals(&missing_normal);
    }

    Ok(mesh)
}

fn run<'a, T>(line_num: usize, result: IResult<&'a str, T>) -> Result<T> {
    result
        .map(|(_, value)| value)
        .map_err(|e| Error::parse(line_num, format!("{:?}", e)))
}

/// Convert an OBJ index (1-based, or negative relative to the end) to 0-based
fn resolve(line_num: usize, index: i64, len: usize) -> Result<usize> {
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => len as i64 + i,
        _ => return Err(Error::parse(line_num, "index 0 is not valid")),
    };
    if resolved < 0 || resolved >= len as i64 {
        return Err(Error::parse(
            line_num,
            format!("index {} out of range ({} defined)", index, len),
        ));
    }
    Ok(resolved as usize)
}

fn vec3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, x) = preceded(space0, float)(input)?;
    let (input, y) = preceded(space1, float)(input)?;
    let (input, z) = preceded(space1, float)(input)?;
    // Optional w component
    let (input, _) = all_consuming(terminated(opt(preceded(space1, float)), space0))(input)?;
    Ok((input, (x, y, z)))
}

fn vec2(input: &str) -> IResult<&str, (f32, f32)> {
    let (input, u) = preceded(space0, float)(input)?;
    let (input, v) = opt(preceded(space1, float))(input)?;
    let (input, _) = all_consuming(terminated(opt(preceded(space1, float)), space0))(input)?;
    Ok((input, (u, v.unwrap_or(0.0))))
}

fn face(input: &str) -> IResult<&str, Vec<Corner>> {
    all_consuming(terminated(many1(preceded(space0, corner)), space0))(input)
}

/// `p`, `p/t`, `p//n` or `p/t/n`
fn corner(input: &str) -> IResult<&str, Corner> {
    let (input, position) = integer(input)?;
    let (input, rest) = opt(preceded(
        char('/'),
        pair(opt(integer), opt(preceded(char('/'), opt(integer)))),
    ))(input)?;

    let (uv, normal) = match rest {
        Some((uv, normal)) => (uv, normal.flatten()),
        None => (None, None),
    };
    Ok((
        input,
        Corner {
            position,
            uv,
            normal,
        },
    ))
}
