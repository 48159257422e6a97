use std::collections::HashSet;

use crate::api::topology_dto::{ConnectionDto, GenericNodeDto, GpuDto, ServerDto, TopologyResponseDto};
use crate::domain::topology::{
    connection::{Connection, LinkType},
    gpu_node::{GpuNode, HealthStatus, clamp_utilization},
    node_record::NodeKind,
    server_node::{ServerNode, ServerStatus},
    snapshot::{IntegrityFault, TopologySnapshot},
};
use crate::domain::utils::id::{ConnectionId, NodeId};

const UNKNOWN: &str = "Unknown";

/// Canonical snapshot plus every fault found while translating the backend payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTopology {
    pub snapshot: TopologySnapshot,
    pub faults: Vec<IntegrityFault>,
}

/// Translates any backend topology shape into the canonical snapshot.
///
/// Elements missing a required field, duplicate node or connection ids and nodes of an
/// unrecognized type are dropped and reported. Connections with dangling endpoints are
/// kept in the snapshot (and reported) so that the renderer can reject them visibly.
pub fn normalize(dto: TopologyResponseDto) -> NormalizedTopology {
    normalize_shape(dto, NodeKind::Server)
}

/// `untyped` is the kind given to generic nodes without a `type` flag.
fn normalize_shape(dto: TopologyResponseDto, untyped: NodeKind) -> NormalizedTopology {
    let mut faults = Vec::new();

    let (gpus, servers, connections) = match dto {
        TopologyResponseDto::Flat(flat) => {
            let gpus = flat.gpus.into_iter().enumerate().filter_map(|(index, gpu)| gpu_from_dto(index, gpu, &mut faults)).collect();
            let servers =
                flat.servers.into_iter().enumerate().filter_map(|(index, server)| server_from_dto(index, server, &mut faults)).collect();
            (gpus, servers, flat.connections)
        }
        TopologyResponseDto::Generic(generic) => {
            let (gpus, servers) = split_generic_nodes(generic.nodes, untyped, &mut faults);
            (gpus, servers, generic.connections)
        }
        // The legacy agent endpoint only reports GPUs.
        TopologyResponseDto::Wrapped(wrapped) => return normalize_shape(*wrapped.topology, NodeKind::Gpu),
    };

    let (gpus, servers) = dedup_nodes(gpus, servers, &mut faults);
    let connections = build_connections(connections, &mut faults);

    let snapshot = TopologySnapshot::new(gpus, servers, connections);
    faults.extend(snapshot.integrity_faults());

    NormalizedTopology { snapshot, faults }
}

fn missing(element: String, field: &'static str, faults: &mut Vec<IntegrityFault>) {
    faults.push(IntegrityFault::MissingField { element, field });
}

fn gpu_from_dto(index: usize, dto: GpuDto, faults: &mut Vec<IntegrityFault>) -> Option<GpuNode> {
    let Some(id) = dto.id else {
        missing(format!("gpu #{}", index), "id", faults);
        return None;
    };

    let temperature = dto.temperature.unwrap_or(0) as i32;
    Some(GpuNode {
        name: dto.name.unwrap_or_else(|| id.clone()),
        model: dto.model.unwrap_or_else(|| UNKNOWN.to_string()),
        health: HealthStatus::resolve(dto.status.as_deref(), temperature),
        temperature,
        utilization: clamp_utilization(dto.utilization),
        memory_total: dto.memory_total.and_then(|v| u64::try_from(v).ok()),
        memory_used: dto.memory_used.and_then(|v| u64::try_from(v).ok()),
        active_jobs: dto.active_jobs.unwrap_or(0).max(0) as u32,
        current_job: dto.current_job,
        id: NodeId::new(id),
    })
}

fn server_from_dto(index: usize, dto: ServerDto, faults: &mut Vec<IntegrityFault>) -> Option<ServerNode> {
    let Some(id) = dto.id else {
        missing(format!("server #{}", index), "id", faults);
        return None;
    };

    Some(ServerNode {
        name: dto.name.unwrap_or_else(|| id.clone()),
        cpu: dto.cpu.unwrap_or_else(|| UNKNOWN.to_string()),
        ram: dto.ram.unwrap_or_else(|| UNKNOWN.to_string()),
        os: dto.os,
        status: ServerStatus::from_label(dto.status.as_deref()),
        active_jobs: dto.active_jobs.unwrap_or(0).max(0) as u32,
        id: NodeId::new(id),
    })
}

/// A node without a type flag becomes `untyped`; an unrecognized flag is a fault.
fn split_generic_nodes(
    nodes: Vec<GenericNodeDto>,
    untyped: NodeKind,
    faults: &mut Vec<IntegrityFault>,
) -> (Vec<GpuNode>, Vec<ServerNode>) {
    let mut gpus = Vec::new();
    let mut servers = Vec::new();

    for (index, node) in nodes.into_iter().enumerate() {
        let Some(id) = node.id else {
            missing(format!("node #{}", index), "id", faults);
            continue;
        };

        let node_type = node.node_type.as_deref().map(|t| t.trim().to_ascii_lowercase());
        let kind = match node_type.as_deref() {
            None => untyped,
            Some("gpu") => NodeKind::Gpu,
            Some("server") | Some("host") => NodeKind::Server,
            Some(other) => {
                faults.push(IntegrityFault::UnknownNodeType { node: NodeId::new(id), node_type: other.to_string() });
                continue;
            }
        };

        match kind {
            NodeKind::Gpu => gpus.extend(gpu_from_dto(
                index,
                GpuDto {
                    id: Some(id),
                    name: node.name,
                    model: node.model,
                    status: node.status,
                    temperature: node.temperature,
                    utilization: node.utilization,
                    memory_total: node.memory_total,
                    memory_used: node.memory_used,
                    active_jobs: node.active_jobs,
                    current_job: node.current_job,
                },
                faults,
            )),
            NodeKind::Server => servers.extend(server_from_dto(
                index,
                ServerDto {
                    id: Some(id),
                    name: node.name,
                    cpu: node.cpu,
                    ram: node.ram,
                    os: node.os,
                    status: node.status,
                    active_jobs: node.active_jobs,
                },
                faults,
            )),
        }
    }

    (gpus, servers)
}

fn dedup_nodes(gpus: Vec<GpuNode>, servers: Vec<ServerNode>, faults: &mut Vec<IntegrityFault>) -> (Vec<GpuNode>, Vec<ServerNode>) {
    let mut seen: HashSet<NodeId> = HashSet::new();

    let servers = servers
        .into_iter()
        .filter(|server| {
            let fresh = seen.insert(server.id.clone());
            if !fresh {
                faults.push(IntegrityFault::DuplicateNode { node: server.id.clone() });
            }
            fresh
        })
        .collect();

    let gpus = gpus
        .into_iter()
        .filter(|gpu| {
            let fresh = seen.insert(gpu.id.clone());
            if !fresh {
                faults.push(IntegrityFault::DuplicateNode { node: gpu.id.clone() });
            }
            fresh
        })
        .collect();

    (gpus, servers)
}

fn build_connections(dtos: Vec<ConnectionDto>, faults: &mut Vec<IntegrityFault>) -> Vec<Connection> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut connections = Vec::with_capacity(dtos.len());

    for (index, dto) in dtos.into_iter().enumerate() {
        let (source, target) = match (dto.source, dto.target) {
            (Some(source), Some(target)) => (source, target),
            (source, _) => {
                let element = dto.id.map_or_else(|| format!("connection #{}", index), |id| format!("connection {}", id));
                missing(element, if source.is_none() { "source" } else { "target" }, faults);
                continue;
            }
        };

        let id = match dto.id {
            Some(id) => {
                if !seen.insert(id.clone()) {
                    faults.push(IntegrityFault::DuplicateConnection { connection: ConnectionId::new(id) });
                    continue;
                }
                id
            }
            None => synthesize_connection_id(&source, &target, &mut seen),
        };

        let mut connection =
            Connection::new(ConnectionId::new(id), NodeId::new(source), NodeId::new(target), LinkType::from_label(dto.link_type.as_deref()));
        connection.bandwidth = dto.bandwidth;
        connections.push(connection);
    }

    connections
}

fn synthesize_connection_id(source: &str, target: &str, seen: &mut HashSet<String>) -> String {
    let base = format!("conn-{}-{}", source, target);
    let mut candidate = base.clone();
    let mut suffix = 1;

    while !seen.insert(candidate.clone()) {
        suffix += 1;
        candidate = format!("{}-{}", base, suffix);
    }

    candidate
}
