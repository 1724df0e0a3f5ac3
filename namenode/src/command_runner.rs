use utilities::result::Result;

use crate::client_handler::ClientHandler;
use crate::cluster::datanode::NodeId;

pub struct CommandRunner {
    handler: ClientHandler,
}

fn parse_node_id(input: &str) -> Result<NodeId> {
    input
        .parse::<NodeId>()
        .map_err(|_| format!("datanode id must be a number, got '{input}'").into())
}

impl CommandRunner {
    pub fn new(handler: ClientHandler) -> Self {
        CommandRunner { handler }
    }
    pub async fn handle_input(&mut self, command: &str) -> Result<String> {
        let command = command.trim_end();
        match command {
            store_command if store_command.starts_with("store") => {
                let inputs: Vec<&str> = store_command.splitn(3, ' ').collect();
                if inputs.len() < 3 {
                    return Err("Invalid store command usage please use <help> to get help".into());
                }
                let blocks = self.handler.upload(inputs[1], inputs[2].as_bytes()).await?;
                Ok(format!("stored '{}' in {} blocks", inputs[1], blocks))
            }
            fetch_command if fetch_command.starts_with("fetch") => {
                let inputs: Vec<&str> = fetch_command.split_whitespace().collect();
                if inputs.len() < 2 {
                    return Err("Invalid fetch command usage please use <help> to get help".into());
                }
                let outcome = self.handler.read(inputs[1]).await?;
                let text = String::from_utf8_lossy(&outcome.content).to_string();
                if outcome.missing_blocks > 0 {
                    return Ok(format!(
                        "{text}\n[warning] {} blocks had no alive replica",
                        outcome.missing_blocks
                    ));
                }
                Ok(text)
            }
            delete_command if delete_command.starts_with("delete") => {
                let inputs: Vec<&str> = delete_command.split_whitespace().collect();
                if inputs.len() < 2 {
                    return Err("Invalid delete command usage please use <help> to get help".into());
                }
                self.handler.delete(inputs[1]).await?;
                Ok(format!("deleted '{}'", inputs[1]))
            }
            meta_command if meta_command.starts_with("meta") => {
                let inputs: Vec<&str> = meta_command.split_whitespace().collect();
                if inputs.len() < 2 {
                    return Err("Invalid meta command usage please use <help> to get help".into());
                }
                let metadata = self.handler.show_metadata(inputs[1]).await?;
                let mut lines = vec![format!(
                    "file '{}' ({} blocks)",
                    metadata.filename,
                    metadata.blocks.len()
                )];
                for block in &metadata.blocks {
                    lines.push(format!(
                        "block {} -> nodes {:?} : {}",
                        block.order,
                        block.replicas,
                        String::from_utf8_lossy(&block.payload)
                    ));
                }
                Ok(lines.join("\n"))
            }
            kill_command if kill_command.starts_with("kill") => {
                let inputs: Vec<&str> = kill_command.split_whitespace().collect();
                if inputs.len() < 2 {
                    return Err("Invalid kill command usage please use <help> to get help".into());
                }
                let node_id = parse_node_id(inputs[1])?;
                self.handler.kill_node(node_id).await?;
                Ok(format!("datanode {node_id} is now dead"))
            }
            recover_command if recover_command.starts_with("recover") => {
                let inputs: Vec<&str> = recover_command.split_whitespace().collect();
                if inputs.len() < 2 {
                    return Err(
                        "Invalid recover command usage please use <help> to get help".into()
                    );
                }
                let node_id = parse_node_id(inputs[1])?;
                self.handler.recover_node(node_id).await?;
                Ok(format!("datanode {node_id} is alive again"))
            }
            removenode_command if removenode_command.starts_with("removenode") => {
                let inputs: Vec<&str> = removenode_command.split_whitespace().collect();
                if inputs.len() < 2 {
                    return Err(
                        "Invalid removenode command usage please use <help> to get help".into(),
                    );
                }
                let node_id = parse_node_id(inputs[1])?;
                self.handler.remove_node(node_id).await?;
                Ok(format!("removed datanode {node_id}"))
            }
            "addnode" => {
                let (node_id, summary) = self.handler.add_node().await?;
                let moved = match summary.donor {
                    Some(donor) => {
                        format!("moved {} payloads from node {}", summary.moved_payloads, donor)
                    }
                    None => "no payloads to move".to_owned(),
                };
                Ok(format!(
                    "added datanode {node_id}; {moved}, filled {} replicas",
                    summary.filled_replicas
                ))
            }
            "list" => {
                let summaries = self.handler.list_files().await;
                if summaries.is_empty() {
                    return Ok("no files stored".to_owned());
                }
                let lines: Vec<String> = summaries
                    .iter()
                    .map(|file| format!("{} ({} blocks)", file.filename, file.block_count))
                    .collect();
                Ok(lines.join("\n"))
            }
            "nodes" => {
                let report = self.handler.node_report().await;
                if report.is_empty() {
                    return Ok("no datanodes registered".to_owned());
                }
                let lines: Vec<String> = report
                    .iter()
                    .map(|node| {
                        format!(
                            "node {} : {}, {} payloads",
                            node.id,
                            if node.alive { "alive" } else { "dead" },
                            node.payload_count
                        )
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            "help" => Ok("\nstore command : store file_name content\nfetch command : fetch file_name\ndelete command : delete file_name\nmeta command : meta file_name\nlist command : list stored files\nnodes command : show datanode status\nkill command : kill node_id\nrecover command : recover node_id\naddnode command : register a datanode and rebalance\nremovenode command : removenode node_id\nexit command : quit\n".to_owned()),
            _ => Err(
                "Invalid Command Please use valid command use help to list available commands"
                    .into(),
            ),
        }
    }
}
