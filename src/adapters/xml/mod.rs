//! XML input adapter
//!
//! Parses the study export into an owned element tree. The export looks like:
//!
//! ```xml
//! <study>
//!   <person lab_id="L-77">
//!     <study_id>999-0001</study_id>
//!     <all_form_events>
//!       <form>
//!         <name>cbc</name>
//!         <event>
//!           <name>1_arm_1</name>
//!           <field><name>wbc</name><value>4.5</value></field>
//!         </event>
//!       </form>
//!     </all_form_events>
//!   </person>
//! </study>
//! ```

pub mod node;
pub mod tree;

pub use node::TreeNode;
pub use tree::{XmlDocument, XmlElement};
