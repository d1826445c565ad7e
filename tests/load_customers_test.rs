// Documents a property-centric package end to end
use ssis_doc::doc::connections::connection_strings;
use ssis_doc::doc::top_level_executables;
use ssis_doc::{document_package, load_package, write_connections_to_file, NodeKind, Warning};
use std::time::Instant;

const PACKAGE: &str = "tests/load_customers.dtsx";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_customers_ingestion() {
        let start = Instant::now();
        let result = load_package(PACKAGE);
        let elapsed = start.elapsed();
        assert!(result.is_ok(), "Failed to load package: {:?}", result.err());

        let (graph, diags) = result.unwrap();
        let root = graph.node(graph.root());
        assert_eq!(root.name(), Some("LoadCustomers"));
        assert_eq!(root.attribute("DTS:ExecutableType"), Some("MSDTS.Package.1"));
        assert!(diags.is_empty(), "unexpected warnings: {:?}", diags.warnings());

        // Identifiers resolve regardless of brace/case spelling
        let copy = graph.lookup("e3000000-0000-0000-0000-000000000003").expect("Copy Customers not registered");
        assert_eq!(graph.node(copy).name(), Some("Copy Customers"));
        let sequence = graph.node(copy).parent().unwrap();
        assert_eq!(graph.node(sequence).name(), Some("Load Customers"));
        assert_eq!(
            graph.ancestor_by_kind(copy, &NodeKind::Executable),
            Some(sequence)
        );

        let names: Vec<_> = top_level_executables(&graph)
            .into_iter()
            .map(|e| graph.node(e).display_name())
            .collect();
        assert_eq!(names, vec!["Truncate Staging", "Load Customers", "Notify"]);

        println!("✓ Loaded {} nodes in {:.3}ms", graph.len(), elapsed.as_secs_f64() * 1000.0);
    }

    #[test]
    fn test_load_customers_document_layout() {
        let (graph, _) = load_package(PACKAGE).expect("Failed to load package");
        let doc = document_package(&graph).expect("Failed to document package");
        let md = &doc.markdown;

        assert!(md.starts_with(
            "# LoadCustomers.dtsx\n## CreatorName - CORP\\etl\n## VersionGUID - {7D3E0B2A-41C5-4F7B-9C1E-2B8A3F6D5E01}\n***\n## Variables\n"
        ));

        let order = [
            "## Variables",
            "## ConnectionsManagers",
            "## Executables",
            "* #### Root Level Executables",
            "* #### Executable Flows",
            "* #### Executables\n",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|marker| md.find(marker).unwrap_or_else(|| panic!("missing section {}", marker)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "sections out of order:\n{}", md);

        #[cfg(debug_assertions)]
        {
            println!("\nGenerated document:\n{}", md);
        }
    }

    #[test]
    fn test_load_customers_variables() {
        let (graph, _) = load_package(PACKAGE).expect("Failed to load package");
        let md = document_package(&graph).unwrap().markdown;

        assert!(md.contains("        * global `int` **User::BatchId** = `0`\n"));
        assert!(md.contains("        * global `string` **User::Label** = `\"He said \\\"hi\\\"\"` (read-only)\n"));
        assert!(md.contains("        * global `bool` **User::LoadFlag** = `true`\n"));
        assert!(md.contains("        * global `DataTable` **User::Customers** = `new DataTable()`\n"));
    }

    #[test]
    fn test_load_customers_connections() {
        let (graph, _) = load_package(PACKAGE).expect("Failed to load package");
        let doc = document_package(&graph).unwrap();
        let md = &doc.markdown;

        assert!(md.contains("* **Warehouse**\n\n| Name | Value |\n"));
        assert!(md.contains(
            "| Connection String | Data Source=.;Initial Catalog=Warehouse;Provider=SQLNCLI10.1;Integrated Security=SSPI; |"
        ));
        assert!(md.contains("| Creation Name | OLEDB |"));
        assert!(md.contains("| DtsId | {C1A0E6D2-5B7F-4E3A-8D21-0F9C4B6A7E11} |"));
        assert!(md.contains("| Description | Main warehouse |"));
        assert!(md.contains(
            "| Connection String | SmtpServer=mail.example.com;UseWindowsAuthentication=False;EnableSsl=False; |"
        ));
        assert!(md.contains("* **Archive**\n\n| Name | Value |\n| --- | --- |\n| Connection String | Not Found |"));

        assert_eq!(doc.warnings.len(), 1);
        assert!(matches!(doc.warnings[0], Warning::ConnectionStringNotFound { .. }));
    }

    #[test]
    fn test_load_customers_flow() {
        let (graph, _) = load_package(PACKAGE).expect("Failed to load package");
        let md = document_package(&graph).unwrap().markdown;

        let flows = md.find("* #### Executable Flows").unwrap();
        let functions = md.find("* #### Executables\n").unwrap();
        let flow = &md[flows..functions];

        let expected = "* #### Executable Flows\n\
            \t* **Truncate Staging**: Execute SQL on **Warehouse**: `TRUNCATE TABLE stg.Customers`\n\
            \t* After Truncate Staging EXECUTE Load Customers\n\
            \t* **Load Customers** (Sequence Container)\n\
            \t\t* **Copy Customers**: Run data flow with components: Customer Source, Customer Destination\n\
            \t\t* After Copy Customers EXECUTE Log Batch\n\
            \t\t* **Log Batch**: Execute SQL on **Warehouse**: `INSERT INTO log.Batch VALUES (?)` (uses User::BatchRows)\n\
            \t* After Load Customers, IF (@[User::LoadFlag] == TRUE), EXECUTE Notify\n\
            \t* **Notify**: Send mail to ops@example.com with subject \"Customers loaded\"\n";
        assert_eq!(flow, expected);
    }

    #[test]
    fn test_load_customers_function_bodies() {
        let (graph, _) = load_package(PACKAGE).expect("Failed to load package");
        let md = document_package(&graph).unwrap().markdown;
        let functions = &md[md.find("* #### Executables\n").unwrap()..];

        assert!(functions.contains("\t* **Truncate Staging** (Execute SQL Task)\n\t\t* Description: Clear staging table\n"));
        assert!(functions.contains("\t\t* Local variables:\n\t\t\t* local `long` **User::BatchRows** = `0`\n"));
        assert!(functions.contains("\t\t* After Copy Customers EXECUTE Log Batch\n\t\t* **Log Batch** (Execute SQL Task)\n"));
        assert!(functions.contains("\t\t\t* Uses: User::BatchRows\n"));
        assert!(functions.contains("\t* After Truncate Staging EXECUTE Load Customers\n\t* **Load Customers** (Sequence Container)\n"));
    }

    #[test]
    fn test_load_customers_app_config() {
        let (graph, _) = load_package(PACKAGE).expect("Failed to load package");
        let doc = document_package(&graph).expect("Failed to document package");
        let strings = connection_strings(&doc.connections);
        assert_eq!(strings.len(), 3);
        assert_eq!(strings[2], ("Archive".to_string(), "Not Found".to_string()));
        assert_eq!(doc.warnings.len(), 1, "a missing connection string is reported once");

        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("app.config");
        write_connections_to_file(&strings, &output_path).expect("Failed to write app.config");

        let written = std::fs::read_to_string(&output_path).unwrap();
        assert!(written.contains("<add key=\"Mail\" value=\"SmtpServer=mail.example.com;UseWindowsAuthentication=False;EnableSsl=False;\" />"));
        assert!(written.contains("<add key=\"Archive\" value=\"Not Found\" />"));
        println!("Output file size: {} bytes", written.len());
    }
}
